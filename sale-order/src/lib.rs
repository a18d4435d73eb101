pub mod models;
pub mod logic;
pub mod core_logic;
pub mod registry;
pub mod builder;
pub mod decorators;
pub mod facade;
pub mod mail;

#[cfg(test)]
mod testing;

pub use models::{OrderState, Partner, SaleOrder, SaleOrderLine, TransactionState};
pub use logic::{LifecycleOp, LogicError, LogicResult, SaleOrderLogic};
pub use core_logic::{CoreSaleOrderLogic, SaleRules};
pub use registry::{DecoratorConstructor, DecoratorRegistry};
pub use builder::{LogicChain, LogicChainBuilder};
pub use facade::SaleOrderFacade;
pub use mail::SaleOrderMail;
