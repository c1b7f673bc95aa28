//! Backward compatibility for the pre-`base_url` translation block.
//!
//! Older configs only supported Ollama and spelled its address
//! `ollama_endpoint`:
//!
//! ```json
//! { "enabled": true, "ollama_endpoint": "http://localhost:11434", "model_name": "qwen2.5" }
//! ```
//!
//! [`migrate_legacy_endpoint`] maps that onto the current shape without
//! touching the caller's value.

use serde_json::{Map, Value};

use super::schema::{ProviderKind, LEGACY_ENDPOINT_FIELD};

/// Rewrite a legacy translation block into the current shape.
///
/// Applies only when `ollama_endpoint` is set and `base_url` is not; the
/// result has `base_url` copied from the legacy field and `model_type`
/// forced to `"ollama"`.  Returns `None` when the block needs no migration.
pub fn migrate_legacy_endpoint(block: &Map<String, Value>) -> Option<Map<String, Value>> {
    let endpoint = block.get(LEGACY_ENDPOINT_FIELD).filter(|v| is_set(v))?;
    if block.get("base_url").is_some_and(is_set) {
        return None;
    }

    let mut migrated = block.clone();
    migrated.insert("base_url".into(), endpoint.clone());
    migrated.insert(
        "model_type".into(),
        Value::String(ProviderKind::Ollama.as_str().into()),
    );
    migrated.remove(LEGACY_ENDPOINT_FIELD);
    Some(migrated)
}

/// `null` and `""` count as "not set".
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
