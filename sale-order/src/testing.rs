//! Recording logic doubles for chain tests

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core_logic::{CoreSaleOrderLogic, SaleRules};
use crate::logic::{LifecycleOp, LogicResult, SaleOrderLogic};
use crate::models::SaleOrder;
use crate::registry::DecoratorConstructor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Before,
    Core,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Visit {
    pub phase: Phase,
    pub layer: String,
    pub op: LifecycleOp,
}

/// Shared log of layer visits, plus a counter used to number decorator instances
#[derive(Default)]
pub(crate) struct Journal {
    visits: Mutex<Vec<Visit>>,
    instances: AtomicUsize,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, phase: Phase, layer: String, op: LifecycleOp) {
        self.visits.lock().push(Visit { phase, layer, op });
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits.lock().clone()
    }

    /// Layers visited in `phase`, in visiting order
    pub fn layers(&self, phase: Phase) -> Vec<String> {
        self.visits
            .lock()
            .iter()
            .filter(|v| v.phase == phase)
            .map(|v| v.layer.clone())
            .collect()
    }

    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.visits.lock().clear();
    }
}

struct RecordingDecorator {
    label: &'static str,
    id: usize,
    journal: Arc<Journal>,
    inner: Box<dyn SaleOrderLogic>,
}

impl RecordingDecorator {
    fn visit(&self, op: LifecycleOp, order: &mut SaleOrder) -> LogicResult<()> {
        let layer = format!("{}{}", self.label, self.id);
        self.journal.record(Phase::Before, layer.clone(), op);
        let result = op.dispatch(self.inner.as_ref(), order);
        self.journal.record(Phase::After, layer, op);
        result
    }
}

impl SaleOrderLogic for RecordingDecorator {
    fn name(&self) -> &str {
        self.label
    }

    fn inner(&self) -> Option<&dyn SaleOrderLogic> {
        Some(self.inner.as_ref())
    }

    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::Confirm, order)
    }

    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::Cancel, order)
    }

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::Validate, order)
    }

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::RecomputePrices, order)
    }
}

/// Constructor for a decorator that logs `<label><instance>` on the way in and out
pub(crate) fn recording(label: &'static str, journal: &Arc<Journal>) -> DecoratorConstructor {
    let journal = Arc::clone(journal);
    Arc::new(move |inner: Box<dyn SaleOrderLogic>| -> LogicResult<Box<dyn SaleOrderLogic>> {
        let id = journal.instances.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingDecorator {
            label,
            id,
            journal: Arc::clone(&journal),
            inner,
        }))
    })
}

/// Core logic that logs its own visits
pub(crate) struct RecordingCore {
    core: CoreSaleOrderLogic,
    journal: Arc<Journal>,
}

impl RecordingCore {
    pub fn new(journal: &Arc<Journal>) -> Self {
        Self {
            core: CoreSaleOrderLogic::new(SaleRules::default()),
            journal: Arc::clone(journal),
        }
    }

    fn visit(&self, op: LifecycleOp, order: &mut SaleOrder) -> LogicResult<()> {
        self.journal.record(Phase::Core, self.core.name().to_string(), op);
        op.dispatch(&self.core, order)
    }
}

impl SaleOrderLogic for RecordingCore {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn action_confirm(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::Confirm, order)
    }

    fn action_cancel(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::Cancel, order)
    }

    fn validate_order(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::Validate, order)
    }

    fn recompute_prices(&self, order: &mut SaleOrder) -> LogicResult<()> {
        self.visit(LifecycleOp::RecomputePrices, order)
    }
}
