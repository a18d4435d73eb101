pub mod app_config;
pub mod parameter_repo;
pub mod order_repo;

pub use parameter_repo::ParameterStore;
pub use order_repo::{InMemoryOrderRepository, OrderRepository, RepositoryError};
