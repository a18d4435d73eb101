use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::decorators;
use crate::logic::{LogicResult, SaleOrderLogic};

/// Builds a decorator around the chain accumulated so far
pub type DecoratorConstructor =
    Arc<dyn Fn(Box<dyn SaleOrderLogic>) -> LogicResult<Box<dyn SaleOrderLogic>> + Send + Sync>;

/// Process-wide registry, pre-populated with the built-in decorators
static GLOBAL_DECORATOR_REGISTRY: Lazy<DecoratorRegistry> = Lazy::new(|| {
    let registry = DecoratorRegistry::new();
    decorators::register_builtins(&registry);
    registry
});

/// Maps configured decorator names to their constructors.
///
/// Names are case sensitive. Registration is expected at start-up (or in test
/// setup), not concurrently with chain builds. Clones share the same table.
#[derive(Clone, Default)]
pub struct DecoratorRegistry {
    constructors: Arc<RwLock<HashMap<String, DecoratorConstructor>>>,
}

impl DecoratorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the built-in decorators
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        decorators::register_builtins(&registry);
        registry
    }

    pub fn global() -> &'static DecoratorRegistry {
        &GLOBAL_DECORATOR_REGISTRY
    }

    /// Register `constructor` under `name`, returning the constructor it replaced
    pub fn register(
        &self,
        name: &str,
        constructor: DecoratorConstructor,
    ) -> Option<DecoratorConstructor> {
        let previous = self.constructors.write().insert(name.to_string(), constructor);
        if previous.is_some() {
            tracing::debug!(decorator = name, "replaced sale order decorator");
        } else {
            tracing::debug!(decorator = name, "registered sale order decorator");
        }
        previous
    }

    /// Register a plain function or closure
    pub fn register_fn<F>(&self, name: &str, constructor: F) -> Option<DecoratorConstructor>
    where
        F: Fn(Box<dyn SaleOrderLogic>) -> LogicResult<Box<dyn SaleOrderLogic>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Arc::new(constructor))
    }

    pub fn unregister(&self, name: &str) -> Option<DecoratorConstructor> {
        let removed = self.constructors.write().remove(name);
        if removed.is_some() {
            tracing::debug!(decorator = name, "unregistered sale order decorator");
        }
        removed
    }

    pub fn resolve(&self, name: &str) -> Option<DecoratorConstructor> {
        self.constructors.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for DecoratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
