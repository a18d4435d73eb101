use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use sale_core::parameters::ConfigParameter;
use sale_core::ConfigProvider;
use sale_shared::models::events::LogicChainResetEvent;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LogicChainResponse {
    pub kind: String,
    /// Layer names, core logic first
    pub layers: Vec<String>,
    /// Decorator names used to build the chain, innermost first
    pub resolved: Vec<String>,
    pub depth: usize,
    pub builds: u64,
    pub registered: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetParameterRequest {
    pub value: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/logic-chain", get(get_logic_chain))
        .route("/v1/admin/logic-chain/reset", post(reset_logic_chain))
        .route("/v1/admin/parameters", get(list_parameters))
        .route("/v1/admin/parameters/{key}", get(get_parameter).put(set_parameter))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/admin/logic-chain
/// Current sale order chain, building it if nothing is cached
pub async fn get_logic_chain(State(state): State<AppState>) -> Result<Json<LogicChainResponse>, AppError> {
    let facade = &state.sale_orders;
    let chain = facade.chain()?;

    Ok(Json(LogicChainResponse {
        kind: facade.builder().kind().to_string(),
        layers: chain.layers(),
        resolved: chain.resolved().to_vec(),
        depth: chain.depth(),
        builds: facade.builder().builds(),
        registered: facade.registry().names(),
    }))
}

/// POST /v1/admin/logic-chain/reset
/// Drop the cached chain; the next lifecycle call rebuilds it from `sale.customize`
pub async fn reset_logic_chain(State(state): State<AppState>) -> Json<LogicChainResetEvent> {
    let previous = state.sale_orders.reset_chain();
    let event = LogicChainResetEvent {
        previous_layers: previous.map(|chain| chain.layers()).unwrap_or_default(),
        timestamp: chrono::Utc::now().timestamp(),
    };
    tracing::info!(previous = ?event.previous_layers, "sale order logic chain reset");

    Json(event)
}

/// GET /v1/admin/parameters
pub async fn list_parameters(State(state): State<AppState>) -> Json<Vec<ConfigParameter>> {
    Json(state.parameters.all())
}

/// GET /v1/admin/parameters/{key}
pub async fn get_parameter(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ConfigParameter>, AppError> {
    let value = state
        .parameters
        .get_param(&key)?
        .ok_or_else(|| AppError::NotFound(format!("Parameter {} not set", key)))?;

    Ok(Json(ConfigParameter { key, value }))
}

/// PUT /v1/admin/parameters/{key}
/// An empty value unsets the parameter. The logic chain is not rebuilt until reset.
pub async fn set_parameter(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetParameterRequest>,
) -> Json<ConfigParameter> {
    state.parameters.set_param(&key, &req.value);
    Json(ConfigParameter { key, value: req.value })
}
