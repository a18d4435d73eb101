use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{CoreError, CoreResult};

/// Ordered, comma separated list of logic decorators applied to sale orders
pub const SALE_CUSTOMIZE_PARAM: &str = "sale.customize";

/// A single key/value system parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigParameter {
    pub key: String,
    pub value: String,
}

/// Source of system parameters (the `ir.config_parameter` style key/value table).
///
/// A missing key is not an error: it is reported as `Ok(None)` and callers treat
/// it as an empty value.
pub trait ConfigProvider: Send + Sync {
    fn get_param(&self, key: &str) -> CoreResult<Option<String>>;

    /// Value of `key`, or the empty string when the key is absent
    fn get_param_or_empty(&self, key: &str) -> CoreResult<String> {
        let value = self.get_param(key)?.unwrap_or_default();
        tracing::trace!(key, value = %value, "read config parameter");
        Ok(value)
    }
}

impl ConfigProvider for HashMap<String, String> {
    fn get_param(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.get(key).cloned())
    }
}

/// Provider that always fails, for exercising error paths
pub struct UnavailableProvider {
    pub reason: String,
}

impl ConfigProvider for UnavailableProvider {
    fn get_param(&self, key: &str) -> CoreResult<Option<String>> {
        Err(CoreError::ParameterUnavailable {
            key: key.to_string(),
            reason: self.reason.clone(),
        })
    }
}
