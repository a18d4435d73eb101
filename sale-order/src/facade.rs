use std::sync::Arc;

use sale_core::ConfigProvider;

use crate::builder::{LogicChain, LogicChainBuilder};
use crate::core_logic::{CoreSaleOrderLogic, SaleRules};
use crate::logic::{LifecycleOp, LogicResult, SaleOrderLogic};
use crate::models::SaleOrder;
use crate::registry::DecoratorRegistry;

/// Creates the terminal link of a chain
pub type CoreLogicFactory = Arc<dyn Fn() -> LogicResult<Box<dyn SaleOrderLogic>> + Send + Sync>;

/// Entry point for sale order lifecycle operations.
///
/// Holds no chain of its own: every call goes through the shared
/// [`LogicChainBuilder`], so all facades using the same builder apply the same
/// decorators until the next reset.
#[derive(Clone)]
pub struct SaleOrderFacade {
    builder: Arc<LogicChainBuilder>,
    registry: DecoratorRegistry,
    params: Arc<dyn ConfigProvider>,
    core_factory: CoreLogicFactory,
}

impl SaleOrderFacade {
    /// Facade over the process-wide sale order chain and decorator registry
    pub fn new(params: Arc<dyn ConfigProvider>, rules: SaleRules) -> Self {
        Self {
            builder: LogicChainBuilder::sale_orders(),
            registry: DecoratorRegistry::global().clone(),
            params,
            core_factory: Arc::new(move || -> LogicResult<Box<dyn SaleOrderLogic>> {
                Ok(Box::new(CoreSaleOrderLogic::new(rules.clone())))
            }),
        }
    }

    pub fn with_builder(mut self, builder: Arc<LogicChainBuilder>) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_registry(mut self, registry: DecoratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_core_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> LogicResult<Box<dyn SaleOrderLogic>> + Send + Sync + 'static,
    {
        self.core_factory = Arc::new(factory);
        self
    }

    pub fn builder(&self) -> &LogicChainBuilder {
        &self.builder
    }

    pub fn registry(&self) -> &DecoratorRegistry {
        &self.registry
    }

    /// The cached chain, built on first use
    pub fn chain(&self) -> LogicResult<Arc<LogicChain>> {
        self.builder
            .get_or_build(|| (self.core_factory)(), self.params.as_ref(), &self.registry)
    }

    /// Drop the shared chain so the next call picks up the current configuration
    pub fn reset_chain(&self) -> Option<Arc<LogicChain>> {
        self.builder.reset()
    }

    pub fn dispatch(&self, op: LifecycleOp, order: &mut SaleOrder) -> LogicResult<()> {
        let chain = self.chain()?;
        op.dispatch(chain.head(), order)
    }

    pub fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.dispatch(LifecycleOp::Confirm, order)
    }

    pub fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.dispatch(LifecycleOp::Cancel, order)
    }

    pub fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.dispatch(LifecycleOp::Validate, order)
    }

    pub fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.dispatch(LifecycleOp::RecomputePrices, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicError;
    use crate::models::{OrderState, Partner, SaleOrderLine};
    use crate::testing::{recording, Journal, Phase, RecordingCore};
    use parking_lot::RwLock;
    use sale_core::{CoreResult, SALE_CUSTOMIZE_PARAM};
    use std::collections::HashMap;

    /// Parameter table that can be changed between calls
    #[derive(Default)]
    struct Params(RwLock<HashMap<String, String>>);

    impl Params {
        fn set(&self, value: &str) {
            self.0.write().insert(SALE_CUSTOMIZE_PARAM.to_string(), value.to_string());
        }
    }

    impl ConfigProvider for Params {
        fn get_param(&self, key: &str) -> CoreResult<Option<String>> {
            Ok(self.0.read().get(key).cloned())
        }
    }

    struct Fixture {
        journal: Arc<Journal>,
        params: Arc<Params>,
        facade: SaleOrderFacade,
    }

    fn fixture(customize: Option<&str>) -> Fixture {
        let journal = Journal::new();
        let registry = DecoratorRegistry::with_builtins();
        registry.register("DummyTrackingDecorator", recording("Dummy", &journal));
        registry.register("A", recording("A", &journal));
        registry.register("B", recording("B", &journal));
        registry.register("C", recording("C", &journal));

        let params = Arc::new(Params::default());
        if let Some(value) = customize {
            params.set(value);
        }

        let core_journal = Arc::clone(&journal);
        let facade = SaleOrderFacade::new(params.clone(), SaleRules::default())
            .with_builder(Arc::new(LogicChainBuilder::new("test")))
            .with_registry(registry)
            .with_core_factory(move || Ok(Box::new(RecordingCore::new(&core_journal))));

        Fixture { journal, params, facade }
    }

    fn create_sale_order() -> SaleOrder {
        let mut order = SaleOrder::new("S00100", Some(Partner::new("Test Partner", None)));
        order.add_line(SaleOrderLine::new("Test Product", 1, 10_000));
        order
    }

    #[test]
    fn test_chain_built_on_first_lifecycle_call() {
        let f = fixture(Some("DummyTrackingDecorator, sale"));
        assert!(f.facade.builder().cached().is_none());

        f.facade.action_confirm(&mut create_sale_order()).unwrap();

        let chain = f.facade.builder().cached().unwrap();
        assert_eq!(chain.depth(), 2);
        assert_eq!(chain.layers(), vec!["sale", "Dummy"]);
    }

    #[test]
    fn test_every_operation_routed_through_decorator() {
        let f = fixture(Some("DummyTrackingDecorator, sale"));

        for op in LifecycleOp::ALL {
            let mut order = create_sale_order();
            f.journal.clear();
            let _ = f.facade.dispatch(op, &mut order);

            let visits = f.journal.visits();
            assert_eq!(visits[0].op, op);
            assert_eq!(visits[0].phase, Phase::Before);
            assert_eq!(visits[0].layer, "Dummy0");
            assert_eq!(visits[1].phase, Phase::Core);
        }
        assert_eq!(f.facade.builder().builds(), 1);
        assert_eq!(f.journal.instances(), 1);
    }

    #[test]
    fn test_nested_decorators_run_last_constructed_first() {
        let value = vec!["DummyTrackingDecorator"; 5].join(", ") + ", sale";
        let f = fixture(Some(&value));

        f.facade.action_confirm(&mut create_sale_order()).unwrap();

        assert_eq!(f.facade.chain().unwrap().depth(), 6);
        assert_eq!(
            f.journal.layers(Phase::Before),
            vec!["Dummy4", "Dummy3", "Dummy2", "Dummy1", "Dummy0"]
        );
    }

    #[test]
    fn test_execution_order_is_a_stack() {
        let f = fixture(Some("A, B, C"));

        f.facade.action_confirm(&mut create_sale_order()).unwrap();

        let visits: Vec<(Phase, String)> = f
            .journal
            .visits()
            .into_iter()
            .map(|v| (v.phase, v.layer))
            .collect();
        assert_eq!(
            visits,
            vec![
                (Phase::Before, "C2".to_string()),
                (Phase::Before, "B1".to_string()),
                (Phase::Before, "A0".to_string()),
                (Phase::Core, "sale".to_string()),
                (Phase::After, "A0".to_string()),
                (Phase::After, "B1".to_string()),
                (Phase::After, "C2".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_configuration_goes_straight_to_core() {
        let f = fixture(None);

        for op in LifecycleOp::ALL {
            let _ = f.facade.dispatch(op, &mut create_sale_order());
        }

        assert_eq!(f.facade.chain().unwrap().depth(), 1);
        let visits = f.journal.visits();
        assert_eq!(visits.len(), 4);
        assert!(visits.iter().all(|v| v.phase == Phase::Core));
    }

    #[test]
    fn test_unregistered_name_has_no_effect() {
        let f = fixture(Some("Missing, sale"));
        let mut order = create_sale_order();

        f.facade.action_confirm(&mut order).unwrap();
        assert_eq!(order.state, OrderState::Sale);
        assert_eq!(f.facade.chain().unwrap().depth(), 1);
    }

    #[test]
    fn test_facades_share_one_chain_until_reset() {
        let f = fixture(Some("A"));
        let other = f.facade.clone();

        let first = f.facade.chain().unwrap();
        f.params.set("A, B");
        other.action_confirm(&mut create_sale_order()).unwrap();
        assert!(LogicChain::ptr_eq(&first, &other.chain().unwrap()));

        other.reset_chain();
        let rebuilt = f.facade.chain().unwrap();
        assert_eq!(rebuilt.layers(), vec!["sale", "A", "B"]);
        assert_eq!(f.facade.builder().builds(), 2);
    }

    #[test]
    fn test_lifecycle_failure_propagates_through_every_layer() {
        let f = fixture(Some("A, B"));
        let mut order = SaleOrder::new("S00101", None);

        let result = f.facade.action_confirm(&mut order);
        assert!(matches!(result, Err(LogicError::ValidationFailed(_))));
        // both decorators still unwound
        assert_eq!(f.journal.layers(Phase::After), vec!["A0", "B1"]);
    }

    #[test]
    fn test_builtin_decorators_through_facade() {
        let params: Arc<dyn ConfigProvider> = Arc::new({
            let mut params = HashMap::new();
            params.insert(SALE_CUSTOMIZE_PARAM.to_string(), "auto_lock, mail_tracking, tracing".to_string());
            params
        });
        let facade = SaleOrderFacade::new(params, SaleRules { tax_rate_bps: 1_000 })
            .with_builder(Arc::new(LogicChainBuilder::new("test")))
            .with_registry(DecoratorRegistry::with_builtins());
        let mut order = create_sale_order();

        facade.recompute_prices(&mut order).unwrap();
        assert_eq!(order.amount_total, 11_000);

        facade.action_confirm(&mut order).unwrap();
        assert_eq!(order.state, OrderState::Sale);
        assert!(order.locked);
        assert_eq!(order.messages.len(), 1);
        assert!(matches!(facade.action_cancel(&mut order), Err(LogicError::Locked(_))));
        assert_eq!(order.messages.len(), 1);
    }
}
