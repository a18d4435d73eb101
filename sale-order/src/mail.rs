//! Mail and notification formatting for sale orders: chatter posting options,
//! recipient group buttons, email subtitles, tracking subtypes and suggested
//! recipients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sale_shared::{format_amount, Masked};

use crate::models::{MessageSubtype, OrderState, SaleOrder};

pub const PORTAL_CUSTOMER_GROUP: &str = "portal_customer";
pub const PORTAL_GROUP: &str = "portal";
pub const FOLLOWER_GROUP: &str = "follower";
pub const CUSTOMER_GROUP: &str = "customer";

/// Flags of the calling context that change how mails are posted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailContext {
    #[serde(default)]
    pub mark_so_as_sent: bool,
    pub mail_post_autofollow: Option<bool>,
    #[serde(default)]
    pub proforma: bool,
    #[serde(default)]
    pub catalog_skip_tracking: bool,
    /// Partner of the user posting the message
    pub author_partner_id: Option<Uuid>,
}

/// Options of a message about to be posted on the order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostOptions {
    #[serde(default)]
    pub partner_ids: Vec<Uuid>,
    pub notify_author: Option<bool>,
}

/// Context forwarded to the chatter when posting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostContext {
    pub mail_post_autofollow: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonAccess {
    pub title: Option<String>,
    pub url: Option<String>,
}

/// A group of notification recipients, as prepared by the mail layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientGroup {
    pub name: String,
    pub active: bool,
    pub has_button_access: bool,
    pub button_access: Option<ButtonAccess>,
}

impl RecipientGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: false,
            has_button_access: true,
            button_access: None,
        }
    }

    fn button_access_mut(&mut self) -> &mut ButtonAccess {
        self.button_access.get_or_insert_with(ButtonAccess::default)
    }
}

/// Values rendered into the notification email layout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderingContext {
    pub lang: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<String>,
}

/// Field values before a write, used to pick a tracking subtype
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitValues {
    pub state: Option<OrderState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedRecipient {
    pub partner_id: Uuid,
    pub name: String,
    pub email: Option<Masked<String>>,
    pub reason: String,
}

/// Mail behavior bound to a single sale order
pub struct SaleOrderMail<'a> {
    order: &'a SaleOrder,
}

impl<'a> SaleOrderMail<'a> {
    pub fn new(order: &'a SaleOrder) -> Self {
        Self { order }
    }

    /// Catalog edits on a draft quotation are not worth tracking
    pub fn discard_tracking(&self, ctx: &MailContext) -> bool {
        self.order.state == OrderState::Draft && ctx.catalog_skip_tracking
    }

    /// Customer-facing groups lose their button on pro-forma invoices. Otherwise
    /// the portal customer gets a button titled after what is left to do, and
    /// followers get a button to the order.
    pub fn notify_get_recipients_groups(
        &self,
        mut groups: Vec<RecipientGroup>,
        ctx: &MailContext,
    ) -> Vec<RecipientGroup> {
        let order = self.order;

        if ctx.proforma {
            for group in groups.iter_mut().filter(|g| {
                matches!(
                    g.name.as_str(),
                    PORTAL_CUSTOMER_GROUP | PORTAL_GROUP | FOLLOWER_GROUP | CUSTOMER_GROUP
                )
            }) {
                group.has_button_access = false;
            }
            return groups;
        }

        if let Some(group) = groups.iter_mut().find(|g| g.name == PORTAL_CUSTOMER_GROUP) {
            let pending = order.is_transaction_pending();
            let title = if order.has_to_be_signed() {
                if order.has_to_be_paid() {
                    Some(if pending { "View Quotation" } else { "Sign & Pay Quotation" })
                } else {
                    Some("Accept & Sign Quotation")
                }
            } else if order.has_to_be_paid() && !pending {
                Some("Accept & Pay Quotation")
            } else if order.state.is_quotation() {
                Some("View Quotation")
            } else {
                None
            };

            let access = group.button_access_mut();
            if let Some(title) = title {
                access.title = Some(title.to_string());
            }
        }

        if let Some(group) = groups.iter_mut().find(|g| g.name == FOLLOWER_GROUP) {
            group.active = true;
            group.has_button_access = true;
            let access = group.button_access_mut();
            access.title = Some(
                if order.state.is_quotation() { "View Quotation" } else { "View Order" }.to_string(),
            );
            access.url = Some(order.action_link("view"));
        }

        groups
    }

    /// Subtitles shown under the email header: `<name> - <customer>` and the
    /// total, which is left out when zero (e.g. freshly created web carts)
    pub fn notify_by_email_prepare_rendering_context(
        &self,
        mut render: RenderingContext,
    ) -> RenderingContext {
        let order = self.order;
        let mut subtitles = vec![match &order.partner {
            Some(partner) => format!("{} - {}", order.name, partner.name),
            None => order.name.clone(),
        }];
        if order.amount_total != 0 {
            subtitles.push(format_amount(
                order.amount_total,
                &order.currency,
                render.lang.as_deref(),
            ));
        }
        render.subtitles = subtitles;
        render
    }

    pub fn track_subtype(&self, init_values: &InitValues) -> Option<MessageSubtype> {
        init_values.state?;
        match self.order.state {
            OrderState::Sale => Some(MessageSubtype::OrderConfirmed),
            OrderState::Sent => Some(MessageSubtype::OrderSent),
            _ => None,
        }
    }

    pub fn message_get_suggested_recipients(
        &self,
        mut recipients: Vec<SuggestedRecipient>,
    ) -> Vec<SuggestedRecipient> {
        if let Some(partner) = &self.order.partner {
            if !recipients.iter().any(|r| r.partner_id == partner.id) {
                recipients.push(SuggestedRecipient {
                    partner_id: partner.id,
                    name: partner.name.clone(),
                    email: partner.email.clone(),
                    reason: "Customer".to_string(),
                });
            }
        }
        recipients
    }
}

/// Prepare a chatter post on `order`.
///
/// With `mark_so_as_sent`, a draft quotation becomes sent (without a tracking
/// message) and, unless the caller decided, the author is notified when they
/// are among the recipients.
pub fn message_post(
    order: &mut SaleOrder,
    ctx: &MailContext,
    mut options: PostOptions,
) -> (PostContext, PostOptions) {
    if ctx.mark_so_as_sent && order.state == OrderState::Draft {
        order.update_state(OrderState::Sent);
        tracing::debug!(order = %order.name, "quotation marked as sent");
    }

    let post_ctx = PostContext {
        mail_post_autofollow: ctx.mail_post_autofollow.unwrap_or(true),
    };

    if ctx.mark_so_as_sent && options.notify_author.is_none() {
        let author_is_recipient = ctx
            .author_partner_id
            .map(|author| options.partner_ids.contains(&author))
            .unwrap_or(false);
        options.notify_author = Some(author_is_recipient);
    }

    (post_ctx, options)
}
