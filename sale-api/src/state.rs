use std::sync::Arc;

use sale_order::SaleOrderFacade;
use sale_shared::Currency;
use sale_store::app_config::{Config, SaleConfig};
use sale_store::{InMemoryOrderRepository, OrderRepository, ParameterStore};

#[derive(Clone)]
pub struct AppState {
    pub order_repo: Arc<dyn OrderRepository>,
    pub parameters: Arc<ParameterStore>,
    pub sale_orders: SaleOrderFacade,
    pub sale: SaleConfig,
}

impl AppState {
    /// State over the process-wide sale order chain
    pub fn from_config(config: &Config) -> Self {
        let parameters = Arc::new(ParameterStore::from_config(config));
        let sale_orders = SaleOrderFacade::new(parameters.clone(), config.sale.rules());

        Self {
            order_repo: Arc::new(InMemoryOrderRepository::new(&config.sale.order_prefix)),
            parameters,
            sale_orders,
            sale: config.sale.clone(),
        }
    }

    /// Currency for new orders; unknown codes fall back to USD
    pub fn currency(&self) -> Currency {
        Currency::from_code(&self.sale.currency).unwrap_or_else(|| {
            tracing::warn!(code = %self.sale.currency, "unknown currency code, using USD");
            Currency::default()
        })
    }
}
