use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logic::{LogicError, LogicResult, SaleOrderLogic};
use crate::models::{OrderState, SaleOrder, SaleOrderLine};

/// Name of the base module; the core logic stands for it in every chain
pub const CORE_LOGIC_NAME: &str = "sale";

/// Business settings the core logic depends on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleRules {
    /// Tax rate in basis points applied on the untaxed amount
    pub tax_rate_bps: u32,
}

impl SaleRules {
    /// Tax on `untaxed`, rounded half up; `None` when it does not fit in minor units
    pub fn tax_on(&self, untaxed: i64) -> Option<i64> {
        let tax = (i128::from(untaxed) * i128::from(self.tax_rate_bps) + 5_000).div_euclid(10_000);
        i64::try_from(tax).ok()
    }
}

fn amounts_out_of_range(order: &SaleOrder) -> LogicError {
    LogicError::ValidationFailed(format!("{} amounts are out of range", order.name))
}

/// Terminal link of every logic chain: the actual order lifecycle rules
pub struct CoreSaleOrderLogic {
    rules: SaleRules,
}

impl CoreSaleOrderLogic {
    pub fn new(rules: SaleRules) -> Self {
        Self { rules }
    }

    fn ensure_quotation(order: &SaleOrder, to: OrderState) -> LogicResult<()> {
        if !order.state.is_quotation() {
            return Err(LogicError::InvalidTransition {
                from: order.state.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

impl SaleOrderLogic for CoreSaleOrderLogic {
    fn name(&self) -> &str {
        CORE_LOGIC_NAME
    }

    /// Validate, then Draft/Sent → Sale
    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.validate_order(order)?;

        let from = order.state;
        order.update_state(OrderState::Sale);
        order.confirmed_at = Some(Utc::now());
        tracing::info!(order = %order.name, %from, "sale order confirmed");
        Ok(())
    }

    /// Any state except Cancel → Cancel, unless the order is locked
    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        if order.locked {
            return Err(LogicError::Locked(order.name.clone()));
        }
        if order.state == OrderState::Cancel {
            return Err(LogicError::InvalidTransition {
                from: order.state.to_string(),
                to: OrderState::Cancel.to_string(),
            });
        }

        let from = order.state;
        order.update_state(OrderState::Cancel);
        tracing::info!(order = %order.name, %from, "sale order cancelled");
        Ok(())
    }

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        Self::ensure_quotation(order, OrderState::Sale)?;

        if order.partner.is_none() {
            return Err(LogicError::ValidationFailed(format!(
                "{} has no customer",
                order.name
            )));
        }
        if order.lines.is_empty() {
            return Err(LogicError::ValidationFailed(format!(
                "{} has no order lines",
                order.name
            )));
        }
        if let Some(line) = order.lines.iter().find(|l| l.quantity < 0) {
            return Err(LogicError::ValidationFailed(format!(
                "line {} has a negative quantity",
                line.product_name
            )));
        }
        Ok(())
    }

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        if !order.state.is_quotation() {
            return Err(LogicError::NotQuotation(order.name.clone()));
        }

        // nothing is written back unless every amount fits
        let subtotals: Vec<i64> = order
            .lines
            .iter()
            .map(SaleOrderLine::compute_subtotal)
            .collect::<Option<_>>()
            .ok_or_else(|| amounts_out_of_range(order))?;
        let untaxed = subtotals
            .iter()
            .try_fold(0i64, |acc, subtotal| acc.checked_add(*subtotal))
            .ok_or_else(|| amounts_out_of_range(order))?;
        let tax = self.rules.tax_on(untaxed).ok_or_else(|| amounts_out_of_range(order))?;
        let total = untaxed.checked_add(tax).ok_or_else(|| amounts_out_of_range(order))?;

        for (line, subtotal) in order.lines.iter_mut().zip(subtotals) {
            line.price_subtotal = subtotal;
        }
        order.amount_untaxed = untaxed;
        order.amount_tax = tax;
        order.amount_total = total;
        order.updated_at = Utc::now();
        tracing::debug!(order = %order.name, total = order.amount_total, "prices recomputed");
        Ok(())
    }
}
