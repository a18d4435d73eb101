use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sale_core::{ConfigProvider, SALE_CUSTOMIZE_PARAM};

use crate::core_logic::CORE_LOGIC_NAME;
use crate::logic::{LogicResult, SaleOrderLogic};
use crate::registry::DecoratorRegistry;

/// Chain cache shared by every sale order facade
static SALE_ORDER_CHAIN: Lazy<Arc<LogicChainBuilder>> =
    Lazy::new(|| Arc::new(LogicChainBuilder::new("sale.order")));

/// Split a `sale.customize` value into decorator names.
///
/// Order and duplicates are kept, blank entries are dropped.
pub fn parse_decorator_names(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// A fully built logic chain: the outermost link plus the decorator names
/// that were resolved to build it, in construction order.
pub struct LogicChain {
    head: Arc<dyn SaleOrderLogic>,
    resolved: Vec<String>,
}

impl LogicChain {
    /// The outermost link, entry point of every lifecycle call
    pub fn head(&self) -> &dyn SaleOrderLogic {
        self.head.as_ref()
    }

    /// Names of the decorators applied, innermost first
    pub fn resolved(&self) -> &[String] {
        &self.resolved
    }

    /// Number of links including the core logic
    pub fn depth(&self) -> usize {
        self.resolved.len() + 1
    }

    /// Names of every link from the core logic outwards, walked through `inner()`
    pub fn layers(&self) -> Vec<String> {
        let mut layers = Vec::with_capacity(self.depth());
        let mut current: Option<&dyn SaleOrderLogic> = Some(self.head.as_ref());
        while let Some(link) = current {
            layers.push(link.name().to_string());
            current = link.inner();
        }
        layers.reverse();
        layers
    }

    /// Whether both handles point to the same built chain
    pub fn ptr_eq(a: &Arc<LogicChain>, b: &Arc<LogicChain>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Debug for LogicChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicChain")
            .field("layers", &self.layers())
            .finish()
    }
}

/// Builds the sale order logic chain from `sale.customize` and memoizes it.
///
/// The cache is either empty or holds a complete chain; it is never
/// invalidated by configuration changes, only by [`LogicChainBuilder::reset`].
/// Build-or-reuse is serialized, so concurrent callers observe a single build.
pub struct LogicChainBuilder {
    kind: &'static str,
    cached: Mutex<Option<Arc<LogicChain>>>,
    builds: AtomicU64,
}

impl LogicChainBuilder {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            cached: Mutex::new(None),
            builds: AtomicU64::new(0),
        }
    }

    /// The process-wide builder used for sale orders
    pub fn sale_orders() -> Arc<LogicChainBuilder> {
        Arc::clone(&SALE_ORDER_CHAIN)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Return the cached chain, building it first if the cache is empty.
    ///
    /// Names that do not resolve are skipped. A failing core factory or
    /// decorator constructor aborts the build and leaves the cache empty.
    ///
    /// The cache lock is held while `core_factory` and the decorator
    /// constructors run, so they must not call back into this builder
    /// (`get_or_build`, `cached` or `reset`): the lock is not reentrant.
    pub fn get_or_build<F>(
        &self,
        core_factory: F,
        params: &dyn ConfigProvider,
        registry: &DecoratorRegistry,
    ) -> LogicResult<Arc<LogicChain>>
    where
        F: FnOnce() -> LogicResult<Box<dyn SaleOrderLogic>>,
    {
        let mut cached = self.cached.lock();
        if let Some(chain) = cached.as_ref() {
            return Ok(Arc::clone(chain));
        }

        let value = params.get_param_or_empty(SALE_CUSTOMIZE_PARAM)?;
        let chain = Arc::new(self.build(core_factory, &value, registry)?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(kind = self.kind, layers = ?chain.layers(), "built logic chain");

        *cached = Some(Arc::clone(&chain));
        Ok(chain)
    }

    fn build<F>(&self, core_factory: F, value: &str, registry: &DecoratorRegistry) -> LogicResult<LogicChain>
    where
        F: FnOnce() -> LogicResult<Box<dyn SaleOrderLogic>>,
    {
        let mut head = core_factory()?;
        let mut resolved = Vec::new();

        for name in parse_decorator_names(value) {
            if name == CORE_LOGIC_NAME {
                continue;
            }
            match registry.resolve(name) {
                Some(constructor) => {
                    head = constructor(head)?;
                    resolved.push(name.to_string());
                }
                None => {
                    tracing::warn!(kind = self.kind, decorator = name, "unknown logic decorator, skipped");
                }
            }
        }

        Ok(LogicChain {
            head: Arc::from(head),
            resolved,
        })
    }

    /// The cached chain, without building
    pub fn cached(&self) -> Option<Arc<LogicChain>> {
        self.cached.lock().clone()
    }

    /// Drop the cached chain; the next lifecycle call rebuilds from current configuration
    pub fn reset(&self) -> Option<Arc<LogicChain>> {
        let previous = self.cached.lock().take();
        if previous.is_some() {
            tracing::info!(kind = self.kind, "logic chain cache reset");
        }
        previous
    }

    /// Number of chains built since creation
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for LogicChainBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicChainBuilder")
            .field("kind", &self.kind)
            .field("cached", &self.cached())
            .field("builds", &self.builds())
            .finish()
    }
}
