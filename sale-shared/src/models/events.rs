use uuid::Uuid;

/// Emitted whenever a lifecycle operation moves an order to another state
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OrderStateChangedEvent {
    pub order_id: Uuid,
    pub order_name: String,
    pub from_state: String,
    pub to_state: String,
    pub timestamp: i64,
}

/// Emitted by the admin surface when the cached logic chain is dropped
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct LogicChainResetEvent {
    pub previous_layers: Vec<String>,
    pub timestamp: i64,
}
