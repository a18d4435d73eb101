pub mod models;
pub mod money;
pub mod pii;

pub use money::{format_amount, Currency, SymbolPosition};
pub use pii::Masked;
