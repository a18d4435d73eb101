use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sale_order::mail::{
    message_post, MailContext, PostContext, PostOptions, RecipientGroup, RenderingContext,
    SuggestedRecipient, CUSTOMER_GROUP, FOLLOWER_GROUP, PORTAL_CUSTOMER_GROUP, PORTAL_GROUP,
};
use sale_order::models::ChatterMessage;
use sale_order::{LifecycleOp, Partner, SaleOrder, SaleOrderLine, SaleOrderMail};
use sale_shared::Currency;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub partner: Option<PartnerRequest>,
    #[serde(default)]
    pub lines: Vec<OrderLineRequest>,
    pub currency: Option<String>,
    #[serde(default)]
    pub require_signature: bool,
    #[serde(default)]
    pub require_payment: bool,
}

#[derive(Debug, Deserialize)]
pub struct PartnerRequest {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_name: String,
    pub quantity: i64,
    pub price_unit: i64,
    #[serde(default)]
    pub discount_bps: u32,
}

#[derive(Debug, Deserialize)]
pub struct SendQuotationRequest {
    #[serde(default)]
    pub partner_ids: Vec<Uuid>,
    pub author_partner_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SendQuotationResponse {
    pub order: SaleOrder,
    pub post_context: PostContext,
    pub notify_author: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub lang: Option<String>,
    #[serde(default)]
    pub proforma: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub rendering: RenderingContext,
    pub groups: Vec<RecipientGroup>,
    pub suggested_recipients: Vec<SuggestedRecipient>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/confirm", post(confirm_order))
        .route("/v1/orders/{id}/cancel", post(cancel_order))
        .route("/v1/orders/{id}/validate", post(validate_order))
        .route("/v1/orders/{id}/recompute-prices", post(recompute_prices))
        .route("/v1/orders/{id}/send", post(send_quotation))
        .route("/v1/orders/{id}/notification", get(get_notification))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Create a quotation and compute its totals
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<SaleOrder>), AppError> {
    let currency = match req.currency.as_deref() {
        Some(code) => Currency::from_code(code)
            .ok_or_else(|| AppError::Unprocessable(format!("Unknown currency {}", code)))?,
        None => state.currency(),
    };

    let partner = req
        .partner
        .map(|p| Partner::new(&p.name, p.email.as_deref()));
    let mut order = SaleOrder::new(&state.order_repo.next_name(), partner);
    order.currency = currency;
    order.require_signature = req.require_signature;
    order.require_payment = req.require_payment;
    for line in req.lines {
        order.add_line(
            SaleOrderLine::new(&line.product_name, line.quantity, line.price_unit)
                .with_discount(line.discount_bps),
        );
    }

    state.sale_orders.recompute_prices(&mut order)?;
    state.order_repo.create_order(order.clone()).await?;
    tracing::info!(order = %order.name, total = order.amount_total, "quotation created");

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/orders
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<SaleOrder>>, AppError> {
    Ok(Json(state.order_repo.list_orders().await?))
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SaleOrder>, AppError> {
    Ok(Json(load_order(&state, order_id).await?))
}

pub async fn confirm_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SaleOrder>, AppError> {
    run_lifecycle(&state, order_id, LifecycleOp::Confirm).await
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SaleOrder>, AppError> {
    run_lifecycle(&state, order_id, LifecycleOp::Cancel).await
}

pub async fn validate_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SaleOrder>, AppError> {
    run_lifecycle(&state, order_id, LifecycleOp::Validate).await
}

pub async fn recompute_prices(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SaleOrder>, AppError> {
    run_lifecycle(&state, order_id, LifecycleOp::RecomputePrices).await
}

/// POST /v1/orders/{id}/send
/// Post the quotation to the customer, marking draft quotations as sent
pub async fn send_quotation(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<SendQuotationRequest>,
) -> Result<Json<SendQuotationResponse>, AppError> {
    let mut order = load_order(&state, order_id).await?;

    let ctx = MailContext {
        mark_so_as_sent: true,
        author_partner_id: req.author_partner_id,
        ..MailContext::default()
    };
    let options = PostOptions {
        partner_ids: req.partner_ids,
        notify_author: None,
    };
    let (post_context, options) = message_post(&mut order, &ctx, options);
    order.post_message(ChatterMessage::note(&format!("Quotation {} sent", order.name)));

    state.order_repo.save_order(&order).await?;

    Ok(Json(SendQuotationResponse {
        order,
        post_context,
        notify_author: options.notify_author,
    }))
}

/// GET /v1/orders/{id}/notification
/// Preview how a notification about the order would be rendered and routed
pub async fn get_notification(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationResponse>, AppError> {
    let order = load_order(&state, order_id).await?;
    let mail = SaleOrderMail::new(&order);

    let ctx = MailContext {
        proforma: query.proforma,
        ..MailContext::default()
    };
    let groups = [PORTAL_CUSTOMER_GROUP, PORTAL_GROUP, FOLLOWER_GROUP, CUSTOMER_GROUP]
        .into_iter()
        .map(RecipientGroup::new)
        .collect();

    let rendering = mail.notify_by_email_prepare_rendering_context(RenderingContext {
        lang: query.lang.or_else(|| state.sale.lang.clone()),
        subtitles: Vec::new(),
    });

    Ok(Json(NotificationResponse {
        rendering,
        groups: mail.notify_get_recipients_groups(groups, &ctx),
        suggested_recipients: mail.message_get_suggested_recipients(Vec::new()),
    }))
}

async fn load_order(state: &AppState, order_id: Uuid) -> Result<SaleOrder, AppError> {
    state
        .order_repo
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

/// Run one lifecycle operation through the sale order chain and store the result.
/// A failed operation leaves the stored order untouched.
async fn run_lifecycle(
    state: &AppState,
    order_id: Uuid,
    op: LifecycleOp,
) -> Result<Json<SaleOrder>, AppError> {
    let mut order = load_order(state, order_id).await?;
    let from = order.state;

    if let Err(e) = state.sale_orders.dispatch(op, &mut order) {
        tracing::warn!(order = %order.name, op = op.as_str(), error = %e, "lifecycle operation rejected");
        return Err(e.into());
    }

    state.order_repo.save_order(&order).await?;
    if from != order.state {
        tracing::info!(order = %order.name, %from, to = %order.state, "order state changed");
    }

    Ok(Json(order))
}
