use parking_lot::RwLock;
use std::collections::HashMap;

use sale_core::parameters::ConfigParameter;
use sale_core::{ConfigProvider, CoreResult, SALE_CUSTOMIZE_PARAM};

use crate::app_config::Config;

/// In-memory system parameter table.
///
/// Changing `sale.customize` here does not rebuild the sale order chain: the
/// cached chain keeps serving until it is reset explicitly.
#[derive(Debug, Default)]
pub struct ParameterStore {
    params: RwLock<HashMap<String, String>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the `[[parameters]]` entries, then `sale.customize`
    pub fn from_config(config: &Config) -> Self {
        let store = Self::new();
        for param in &config.parameters {
            store.set_param(&param.key, &param.value);
        }
        if let Some(customize) = &config.sale.customize {
            store.set_param(SALE_CUSTOMIZE_PARAM, customize);
        }
        store
    }

    /// Set `key`; an empty value removes it
    pub fn set_param(&self, key: &str, value: &str) {
        let mut params = self.params.write();
        if value.is_empty() {
            params.remove(key);
        } else {
            params.insert(key.to_string(), value.to_string());
        }
        tracing::debug!(key, value, "config parameter updated");
    }

    pub fn unset_param(&self, key: &str) -> Option<String> {
        self.params.write().remove(key)
    }

    /// All parameters, ordered by key
    pub fn all(&self) -> Vec<ConfigParameter> {
        let mut all: Vec<ConfigParameter> = self
            .params
            .read()
            .iter()
            .map(|(key, value)| ConfigParameter {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }
}

impl ConfigProvider for ParameterStore {
    fn get_param(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.params.read().get(key).cloned())
    }
}
