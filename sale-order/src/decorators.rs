//! Built-in sale order logic decorators.
//!
//! Each decorator owns the chain built so far and forwards every lifecycle
//! operation to it exactly once.

use std::time::Instant;

use crate::logic::{LifecycleOp, LogicResult, SaleOrderLogic};
use crate::mail::{InitValues, MailContext, SaleOrderMail};
use crate::models::{ChatterMessage, SaleOrder};
use crate::registry::DecoratorRegistry;

pub const TRACING: &str = "tracing";
pub const MAIL_TRACKING: &str = "mail_tracking";
pub const AUTO_LOCK: &str = "auto_lock";

pub const BUILTIN_DECORATORS: [&str; 3] = [TRACING, MAIL_TRACKING, AUTO_LOCK];

/// Operations slower than this are logged at warn level
const SLOW_OPERATION_MS: u128 = 10;

pub fn register_builtins(registry: &DecoratorRegistry) {
    registry.register_fn(TRACING, |inner| Ok(Box::new(TracingDecorator::new(inner))));
    registry.register_fn(MAIL_TRACKING, |inner| {
        Ok(Box::new(MailTrackingDecorator::new(inner)))
    });
    registry.register_fn(AUTO_LOCK, |inner| Ok(Box::new(AutoLockDecorator::new(inner))));
}

/// Runs every operation inside a `tracing` span and reports its duration
pub struct TracingDecorator {
    inner: Box<dyn SaleOrderLogic>,
}

impl TracingDecorator {
    pub fn new(inner: Box<dyn SaleOrderLogic>) -> Self {
        Self { inner }
    }

    fn observe(&self, op: LifecycleOp, order: &mut SaleOrder) -> LogicResult<()> {
        let span = tracing::info_span!("sale_order_logic", op = op.as_str(), order = %order.name);
        let _guard = span.enter();
        let started = Instant::now();

        let result = op.dispatch(self.inner.as_ref(), order);

        let elapsed = started.elapsed();
        match &result {
            Ok(()) if elapsed.as_millis() > SLOW_OPERATION_MS => {
                tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "slow lifecycle operation");
            }
            Ok(()) => {
                tracing::debug!(elapsed_us = elapsed.as_micros() as u64, "lifecycle operation done");
            }
            Err(e) => tracing::warn!(error = %e, "lifecycle operation failed"),
        }
        result
    }
}

impl SaleOrderLogic for TracingDecorator {
    fn name(&self) -> &str {
        TRACING
    }

    fn inner(&self) -> Option<&dyn SaleOrderLogic> {
        Some(self.inner.as_ref())
    }

    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.observe(LifecycleOp::Confirm, order)
    }

    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.observe(LifecycleOp::Cancel, order)
    }

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.observe(LifecycleOp::Validate, order)
    }

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.observe(LifecycleOp::RecomputePrices, order)
    }
}

/// Posts a chatter tracking message whenever an operation changes the order state.
///
/// Tracking is skipped for orders that the mail context says to leave
/// untracked (see [`SaleOrderMail::discard_tracking`]), judged on the order as
/// it was before the operation.
pub struct MailTrackingDecorator {
    inner: Box<dyn SaleOrderLogic>,
    ctx: MailContext,
}

impl MailTrackingDecorator {
    pub fn new(inner: Box<dyn SaleOrderLogic>) -> Self {
        Self::with_context(inner, MailContext::default())
    }

    pub fn with_context(inner: Box<dyn SaleOrderLogic>, ctx: MailContext) -> Self {
        Self { inner, ctx }
    }

    fn track(&self, op: LifecycleOp, order: &mut SaleOrder) -> LogicResult<()> {
        let before = order.state;
        let discard = SaleOrderMail::new(order).discard_tracking(&self.ctx);
        op.dispatch(self.inner.as_ref(), order)?;

        if discard {
            tracing::debug!(order = %order.name, op = op.as_str(), "state tracking discarded");
        } else if order.state != before {
            let subtype = SaleOrderMail::new(order).track_subtype(&InitValues { state: Some(before) });
            let message = ChatterMessage::state_tracking(order, before, subtype);
            order.post_message(message);
        }
        Ok(())
    }
}

impl SaleOrderLogic for MailTrackingDecorator {
    fn name(&self) -> &str {
        MAIL_TRACKING
    }

    fn inner(&self) -> Option<&dyn SaleOrderLogic> {
        Some(self.inner.as_ref())
    }

    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.track(LifecycleOp::Confirm, order)
    }

    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.track(LifecycleOp::Cancel, order)
    }

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.track(LifecycleOp::Validate, order)
    }

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.track(LifecycleOp::RecomputePrices, order)
    }
}

/// Locks orders once they are confirmed, so they can no longer be cancelled
pub struct AutoLockDecorator {
    inner: Box<dyn SaleOrderLogic>,
}

impl AutoLockDecorator {
    pub fn new(inner: Box<dyn SaleOrderLogic>) -> Self {
        Self { inner }
    }
}

impl SaleOrderLogic for AutoLockDecorator {
    fn name(&self) -> &str {
        AUTO_LOCK
    }

    fn inner(&self) -> Option<&dyn SaleOrderLogic> {
        Some(self.inner.as_ref())
    }

    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.inner.action_confirm(order)?;
        order.locked = true;
        tracing::debug!(order = %order.name, "order locked after confirmation");
        Ok(())
    }

    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.inner.action_cancel(order)
    }

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.inner.validate_order(order)
    }

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.inner.recompute_prices(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_logic::{CoreSaleOrderLogic, SaleRules};
    use crate::logic::LogicError;
    use crate::models::{MessageSubtype, OrderState, Partner, SaleOrderLine};

    fn core() -> Box<dyn SaleOrderLogic> {
        Box::new(CoreSaleOrderLogic::new(SaleRules::default()))
    }

    fn quotation() -> SaleOrder {
        let mut order = SaleOrder::new("S00020", Some(Partner::new("Test Partner", None)));
        order.add_line(SaleOrderLine::new("Test Product", 1, 10_000));
        order
    }

    #[test]
    fn test_auto_lock_after_confirm() {
        let logic = AutoLockDecorator::new(core());
        let mut order = quotation();

        logic.action_confirm(&mut order).unwrap();
        assert!(order.locked);
        assert!(matches!(logic.action_cancel(&mut order), Err(LogicError::Locked(_))));
    }

    #[test]
    fn test_auto_lock_not_applied_on_failure() {
        let logic = AutoLockDecorator::new(core());
        let mut order = SaleOrder::new("S00021", None);

        assert!(logic.action_confirm(&mut order).is_err());
        assert!(!order.locked);
    }

    #[test]
    fn test_mail_tracking_posts_on_state_change() {
        let logic = MailTrackingDecorator::new(core());
        let mut order = quotation();

        logic.recompute_prices(&mut order).unwrap();
        assert!(order.messages.is_empty());

        logic.action_confirm(&mut order).unwrap();
        assert_eq!(order.messages.len(), 1);
        assert_eq!(order.messages[0].subtype, Some(MessageSubtype::OrderConfirmed));

        let mut cancelled = quotation();
        logic.action_cancel(&mut cancelled).unwrap();
        assert_eq!(cancelled.state, OrderState::Cancel);
        assert_eq!(cancelled.messages[0].subtype, None);
        assert_eq!(cancelled.messages[0].body, "State changed: draft → cancel");
    }

    #[test]
    fn test_mail_tracking_discarded_for_catalog_drafts() {
        let ctx = MailContext { catalog_skip_tracking: true, ..MailContext::default() };
        let logic = MailTrackingDecorator::with_context(core(), ctx);

        let mut draft = quotation();
        logic.action_confirm(&mut draft).unwrap();
        assert_eq!(draft.state, OrderState::Sale);
        assert!(draft.messages.is_empty());

        // only drafts are exempt
        let mut sent = quotation();
        sent.update_state(OrderState::Sent);
        logic.action_confirm(&mut sent).unwrap();
        assert_eq!(sent.messages.len(), 1);
        assert_eq!(sent.messages[0].subtype, Some(MessageSubtype::OrderConfirmed));
    }

    #[test]
    fn test_tracing_decorator_is_transparent() {
        let logic = TracingDecorator::new(core());
        let mut order = quotation();

        logic.validate_order(&mut order).unwrap();
        logic.action_confirm(&mut order).unwrap();
        assert_eq!(order.state, OrderState::Sale);
        assert!(logic.recompute_prices(&mut order).is_err());
        assert_eq!(logic.inner().unwrap().name(), "sale");
    }
}
