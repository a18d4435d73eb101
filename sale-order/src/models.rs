use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

use sale_shared::models::events::OrderStateChangedEvent;
use sale_shared::{Currency, Masked};

/// Sale order state in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Draft,
    Sent,
    Sale,
    Cancel,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Sent => "sent",
            OrderState::Sale => "sale",
            OrderState::Cancel => "cancel",
        }
    }

    /// Draft and sent orders are still quotations
    pub fn is_quotation(&self) -> bool {
        matches!(self, OrderState::Draft | OrderState::Sent)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the last online payment transaction linked to the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Draft,
    Pending,
    Authorized,
    Done,
    Cancel,
    Error,
}

/// The customer of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub email: Option<Masked<String>>,
}

impl Partner {
    pub fn new(name: &str, email: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.map(|e| Masked::new(e.to_string())),
        }
    }
}

/// Chatter subtypes posted for order state changes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    OrderConfirmed,
    OrderSent,
}

impl MessageSubtype {
    pub fn xml_id(&self) -> &'static str {
        match self {
            MessageSubtype::OrderConfirmed => "sale.mt_order_confirmed",
            MessageSubtype::OrderSent => "sale.mt_order_sent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MessageSubtype::OrderConfirmed => "Quotation confirmed",
            MessageSubtype::OrderSent => "Quotation sent",
        }
    }
}

/// A message in the order's chatter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatterMessage {
    pub id: Uuid,
    pub body: String,
    pub subtype: Option<MessageSubtype>,
    pub tracking: Option<OrderStateChangedEvent>,
    pub created_at: DateTime<Utc>,
}

impl ChatterMessage {
    pub fn note(body: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: body.to_string(),
            subtype: None,
            tracking: None,
            created_at: Utc::now(),
        }
    }

    /// Tracking message for a state change, e.g. `draft → sale`
    pub fn state_tracking(
        order: &SaleOrder,
        from: OrderState,
        subtype: Option<MessageSubtype>,
    ) -> Self {
        let now = Utc::now();
        let body = match subtype {
            Some(subtype) => subtype.description().to_string(),
            None => format!("State changed: {} → {}", from, order.state),
        };
        Self {
            id: Uuid::new_v4(),
            body,
            subtype,
            tracking: Some(OrderStateChangedEvent {
                order_id: order.id,
                order_name: order.name.clone(),
                from_state: from.to_string(),
                to_state: order.state.to_string(),
                timestamp: now.timestamp(),
            }),
            created_at: now,
        }
    }
}

/// A product line of a sale order. Prices are in the order currency's minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrderLine {
    pub id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub price_unit: i64,
    /// Discount in basis points (2500 = 25%)
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub price_subtotal: i64,
}

impl SaleOrderLine {
    pub fn new(product_name: &str, quantity: i64, price_unit: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name: product_name.to_string(),
            quantity,
            price_unit,
            discount_bps: 0,
            price_subtotal: 0,
        }
    }

    pub fn with_discount(mut self, discount_bps: u32) -> Self {
        self.discount_bps = discount_bps.min(10_000);
        self
    }

    /// Quantity × unit price minus the discount, rounded half up.
    /// `None` when the subtotal does not fit in minor units.
    pub fn compute_subtotal(&self) -> Option<i64> {
        let gross = i128::from(self.quantity) * i128::from(self.price_unit);
        let kept = i128::from(10_000 - self.discount_bps.min(10_000));
        let subtotal = gross.checked_mul(kept)?.checked_add(5_000)?.div_euclid(10_000);
        i64::try_from(subtotal).ok()
    }
}

/// A customer quotation or confirmed sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrder {
    pub id: Uuid,
    pub name: String,
    pub partner: Option<Partner>,
    pub state: OrderState,
    pub locked: bool,
    pub lines: Vec<SaleOrderLine>,
    pub currency: Currency,
    pub amount_untaxed: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
    pub require_signature: bool,
    pub require_payment: bool,
    pub signed_by: Option<String>,
    pub last_transaction_state: Option<TransactionState>,
    pub messages: Vec<ChatterMessage>,
    pub date_order: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SaleOrder {
    pub fn new(name: &str, partner: Option<Partner>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            partner,
            state: OrderState::Draft,
            locked: false,
            lines: Vec::new(),
            currency: Currency::default(),
            amount_untaxed: 0,
            amount_tax: 0,
            amount_total: 0,
            require_signature: false,
            require_payment: false,
            signed_by: None,
            last_transaction_state: None,
            messages: Vec::new(),
            date_order: now,
            confirmed_at: None,
            updated_at: now,
        }
    }

    /// Add a line; totals are only refreshed by a price recomputation
    pub fn add_line(&mut self, line: SaleOrderLine) {
        self.lines.push(line);
        self.updated_at = Utc::now();
    }

    pub fn update_state(&mut self, new_state: OrderState) {
        self.state = new_state;
        self.updated_at = Utc::now();
    }

    pub fn post_message(&mut self, message: ChatterMessage) {
        self.messages.push(message);
    }

    /// The customer still has to sign the quotation online
    pub fn has_to_be_signed(&self) -> bool {
        self.state.is_quotation() && self.require_signature && self.signed_by.is_none()
    }

    /// The customer still has to pay the quotation online
    pub fn has_to_be_paid(&self) -> bool {
        let settled = matches!(
            self.last_transaction_state,
            Some(TransactionState::Authorized | TransactionState::Done)
        );
        self.state.is_quotation() && self.require_payment && self.amount_total > 0 && !settled
    }

    pub fn is_transaction_pending(&self) -> bool {
        self.last_transaction_state == Some(TransactionState::Pending)
    }

    /// Portal link used in notification buttons
    pub fn action_link(&self, action: &str) -> String {
        format!("/my/orders/{}?action={}", self.id, action)
    }
}
