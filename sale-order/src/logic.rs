use serde::{Deserialize, Serialize};

use crate::models::SaleOrder;

/// The four lifecycle operations routed through the logic chain
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOp {
    Confirm,
    Cancel,
    Validate,
    RecomputePrices,
}

impl LifecycleOp {
    pub const ALL: [LifecycleOp; 4] = [
        LifecycleOp::Confirm,
        LifecycleOp::Cancel,
        LifecycleOp::Validate,
        LifecycleOp::RecomputePrices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Confirm => "confirm",
            LifecycleOp::Cancel => "cancel",
            LifecycleOp::Validate => "validate",
            LifecycleOp::RecomputePrices => "recompute_prices",
        }
    }

    /// Invoke the matching operation on `logic`
    pub fn dispatch(self, logic: &dyn SaleOrderLogic, order: &mut SaleOrder) -> LogicResult<()> {
        match self {
            LifecycleOp::Confirm => logic.action_confirm(order),
            LifecycleOp::Cancel => logic.action_cancel(order),
            LifecycleOp::Validate => logic.validate_order(order),
            LifecycleOp::RecomputePrices => logic.recompute_prices(order),
        }
    }
}

/// Lifecycle behavior of a sale order.
///
/// Implemented by the core logic (the terminal link) and by every decorator.
/// A decorator owns exactly one inner implementation, exposes it through
/// [`SaleOrderLogic::inner`], and calls the matching inner operation exactly once
/// per call.
pub trait SaleOrderLogic: Send + Sync {
    /// Name the implementation is registered under
    fn name(&self) -> &str;

    /// The wrapped implementation, `None` for the core logic
    fn inner(&self) -> Option<&dyn SaleOrderLogic> {
        None
    }

    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()>;

    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()>;

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()>;

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum LogicError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order validation failed: {0}")]
    ValidationFailed(String),

    #[error("Order {0} is locked")]
    Locked(String),

    #[error("Order {0} is no longer a quotation")]
    NotQuotation(String),

    #[error("Decorator {name} could not be constructed: {reason}")]
    Construction { name: String, reason: String },

    #[error(transparent)]
    Config(#[from] sale_core::CoreError),
}

pub type LogicResult<T> = Result<T, LogicError>;
