use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use sale_order::SaleOrder;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Order {0} not found")]
    NotFound(Uuid),
    #[error("Order {0} already exists")]
    Duplicate(Uuid),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: SaleOrder) -> Result<Uuid, RepositoryError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<SaleOrder>, RepositoryError>;

    /// Replace a stored order
    async fn save_order(&self, order: &SaleOrder) -> Result<(), RepositoryError>;

    async fn list_orders(&self) -> Result<Vec<SaleOrder>, RepositoryError>;

    /// Next reference from the order sequence, e.g. `S00042`
    fn next_name(&self) -> String;
}

pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, SaleOrder>>,
    sequence: AtomicU64,
    prefix: String,
}

impl InMemoryOrderRepository {
    pub fn new(prefix: &str) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            prefix: prefix.to_string(),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new("S")
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: SaleOrder) -> Result<Uuid, RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(RepositoryError::Duplicate(order.id));
        }
        let id = order.id;
        tracing::debug!(order_id = %id, name = %order.name, "order created");
        orders.insert(id, order);
        Ok(id)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<SaleOrder>, RepositoryError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn save_order(&self, order: &SaleOrder) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(order.id)),
        }
    }

    async fn list_orders(&self) -> Result<Vec<SaleOrder>, RepositoryError> {
        let mut orders: Vec<SaleOrder> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(orders)
    }

    fn next_name(&self) -> String {
        let next = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{:05}", self.prefix, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sale_order::OrderState;

    #[tokio::test]
    async fn test_create_and_save_order() {
        let repo = InMemoryOrderRepository::default();
        let mut order = SaleOrder::new(&repo.next_name(), None);
        let id = repo.create_order(order.clone()).await.unwrap();

        order.update_state(OrderState::Sale);
        repo.save_order(&order).await.unwrap();

        let stored = repo.get_order(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "S00001");
        assert_eq!(stored.state, OrderState::Sale);
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_orders() {
        let repo = InMemoryOrderRepository::new("SO");
        let order = SaleOrder::new(&repo.next_name(), None);
        repo.create_order(order.clone()).await.unwrap();

        assert!(matches!(
            repo.create_order(order.clone()).await,
            Err(RepositoryError::Duplicate(id)) if id == order.id
        ));

        let unknown = SaleOrder::new("SO99999", None);
        assert!(matches!(
            repo.save_order(&unknown).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(repo.get_order(unknown.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let repo = InMemoryOrderRepository::default();
        let names: Vec<String> = (0..3).map(|_| repo.next_name()).collect();
        for name in names.iter().rev() {
            repo.create_order(SaleOrder::new(name, None)).await.unwrap();
        }

        let listed: Vec<String> = repo.list_orders().await.unwrap().into_iter().map(|o| o.name).collect();
        assert_eq!(listed, vec!["S00001", "S00002", "S00003"]);
    }
}
