//! Settings persisted through the host's key-value storage.
//!
//! Storage failures never surface: reads fall back to defaults and writes
//! are logged and dropped.

use std::sync::Arc;

use heymic_protocols::host::StorageHost;
use serde_json::Value;
use tracing::warn;

pub const DOM_EFFECTS_KEY: &str = "htmlDomLayoutEnabled";
pub const DOM_LIFT_SCALE_KEY: &str = "domLiftScale";

pub const DEFAULT_LIFT_SCALE: f64 = 1.15;
pub const MIN_LIFT_SCALE: f64 = 1.0;
pub const MAX_LIFT_SCALE: f64 = 2.5;

/// Clamp a lift scale into range. Non-finite values fall back to the default.
pub fn clamp_lift_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_LIFT_SCALE, MAX_LIFT_SCALE)
    } else {
        DEFAULT_LIFT_SCALE
    }
}

pub struct SettingsStore {
    storage: Arc<dyn StorageHost>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn StorageHost>) -> Self {
        Self { storage }
    }

    async fn read(&self, key: &str) -> Option<Value> {
        match self.storage.storage_get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "settings read failed, using default");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: Value) {
        if let Err(e) = self.storage.storage_set(key, value).await {
            warn!(key, error = %e, "settings write failed");
        }
    }

    pub async fn dom_effects_enabled(&self) -> bool {
        self.read(DOM_EFFECTS_KEY)
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub async fn set_dom_effects_enabled(&self, enabled: bool) {
        self.write(DOM_EFFECTS_KEY, Value::Bool(enabled)).await;
    }

    pub async fn dom_lift_scale(&self) -> f64 {
        self.read(DOM_LIFT_SCALE_KEY)
            .await
            .and_then(|v| v.as_f64())
            .map(clamp_lift_scale)
            .unwrap_or(DEFAULT_LIFT_SCALE)
    }

    /// Store a lift scale and return the clamped value that was stored.
    pub async fn set_dom_lift_scale(&self, scale: f64) -> f64 {
        let scale = clamp_lift_scale(scale);
        self.write(DOM_LIFT_SCALE_KEY, Value::from(scale)).await;
        scale
    }
}
