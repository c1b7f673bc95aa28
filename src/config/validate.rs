//! Fail-fast validation of a parsed `voice.config.json`.
//!
//! Order of checks (the first violation wins):
//!
//! 1. Global fields: `volume`, `gpt_sovits_url`, `gpt_sovits_path`, existence
//!    of the install directory, then `model_version`.
//! 2. The `translate` block: `enabled`, legacy migration, provider,
//!    `base_url` / `model_name`, API key.
//! 3. Each `characters[i]`: required fields, referenced files, inference
//!    overrides.
//!
//! The input value is never modified; migration works on a copy.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use url::{Host, Url};

use super::error::{ConfigError, ValidationError};
use super::migrate::migrate_legacy_endpoint;
use super::schema::{
    CharacterProfile, FieldKind, FieldRule, PathBase, PathRule, ProviderKind, RootConfig,
    TranslationBackend, TranslationConfig, CHARACTERS_RULE, CHARACTER_FIELDS, CHARACTER_PATHS,
    INFERENCE_FIELDS, INFERENCE_RANGES, LANGUAGE_FIELDS, MODEL_VERSION_RULE, SERVICE_FIELDS,
    SERVICE_PATHS, TRANSLATE_API_KEY_FIELD, TRANSLATE_BACKEND_FIELDS, TRANSLATE_ENABLED_RULE,
    TRANSLATE_PROVIDER_FIELD, TRANSLATE_RULE, VOLUME_RULE,
};
use crate::request::is_supported_language;

const TRANSLATE_SCOPE: &str = "translate";

impl RootConfig {
    /// Parse and validate a JSON document in one step.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_json::from_str(text)?;
        Ok(validate(&document)?)
    }
}

/// Validate a parsed document and build the typed [`RootConfig`].
pub fn validate(document: &Value) -> Result<RootConfig, ValidationError> {
    let root = document
        .as_object()
        .ok_or_else(|| ValidationError::WrongType {
            field: "voice config".into(),
            expected: FieldKind::Table.describe(),
        })?;

    let volume = check_field(root, &VOLUME_RULE, "")?
        .as_f64()
        .ok_or_else(|| wrong_type(&VOLUME_RULE, ""))?;
    check_fields(root, SERVICE_FIELDS, "")?;
    check_paths(root, SERVICE_PATHS, "", Path::new(""))?;
    check_field(root, &MODEL_VERSION_RULE, "")?;

    let translate = check_field(root, &TRANSLATE_RULE, "")?
        .as_object()
        .ok_or_else(|| wrong_type(&TRANSLATE_RULE, ""))?;
    let translation = validate_translation(translate)?;

    let install_dir = PathBuf::from(text(root, "gpt_sovits_path"));
    let entries = check_field(root, &CHARACTERS_RULE, "")?
        .as_array()
        .ok_or_else(|| wrong_type(&CHARACTERS_RULE, ""))?;
    let characters = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| validate_character(index, entry, &install_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RootConfig {
        volume,
        synthesis_service_url: text(root, "gpt_sovits_url").to_string(),
        synthesis_service_path: install_dir,
        model_version: text(root, "model_version").to_string(),
        translation,
        characters,
    })
}

// ---------------------------------------------------------------------------
// Rule-table helpers
// ---------------------------------------------------------------------------

fn field_path(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

/// Look up `name`; `null` is treated as missing.
fn require<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    scope: &str,
) -> Result<&'a Value, ValidationError> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(ValidationError::Missing {
            field: field_path(scope, name),
        }),
        Some(value) => Ok(value),
    }
}

fn check_field<'a>(
    obj: &'a Map<String, Value>,
    rule: &FieldRule,
    scope: &str,
) -> Result<&'a Value, ValidationError> {
    let value = require(obj, rule.name, scope)?;

    match rule.kind {
        FieldKind::Text => match value.as_str() {
            Some("") => {
                return Err(ValidationError::Empty {
                    field: field_path(scope, rule.name),
                })
            }
            Some(_) => {}
            None => return Err(wrong_type(rule, scope)),
        },
        FieldKind::PositiveNumber => match value.as_f64() {
            Some(n) if n > 0.0 => {}
            Some(n) => {
                return Err(ValidationError::NotPositive {
                    field: field_path(scope, rule.name),
                    value: n,
                })
            }
            None => return Err(wrong_type(rule, scope)),
        },
        FieldKind::Flag if !value.is_boolean() => return Err(wrong_type(rule, scope)),
        FieldKind::List if !value.is_array() => return Err(wrong_type(rule, scope)),
        FieldKind::Table if !value.is_object() => return Err(wrong_type(rule, scope)),
        FieldKind::Flag | FieldKind::List | FieldKind::Table => {}
    }
    Ok(value)
}

fn wrong_type(rule: &FieldRule, scope: &str) -> ValidationError {
    ValidationError::WrongType {
        field: field_path(scope, rule.name),
        expected: rule.kind.describe(),
    }
}

fn check_fields(
    obj: &Map<String, Value>,
    rules: &[FieldRule],
    scope: &str,
) -> Result<(), ValidationError> {
    for rule in rules {
        check_field(obj, rule, scope)?;
    }
    Ok(())
}

/// Existence checks for path-valued fields.  Run after `check_fields`, so
/// every field here is already known to be a non-empty string.
fn check_paths(
    obj: &Map<String, Value>,
    rules: &[PathRule],
    scope: &str,
    install_dir: &Path,
) -> Result<(), ValidationError> {
    for rule in rules {
        let raw = require(obj, rule.field, scope)?
            .as_str()
            .unwrap_or_default();
        let path = match rule.base {
            PathBase::AsGiven => PathBuf::from(raw),
            PathBase::InstallDir => install_dir.join(raw),
        };
        if !path.exists() {
            return Err(ValidationError::PathNotFound {
                field: field_path(scope, rule.field),
                path,
            });
        }
    }
    Ok(())
}

/// String value of an already-checked field.
fn text<'a>(obj: &'a Map<String, Value>, name: &str) -> &'a str {
    obj.get(name).and_then(Value::as_str).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

fn validate_translation(block: &Map<String, Value>) -> Result<TranslationConfig, ValidationError> {
    let enabled = check_field(block, &TRANSLATE_ENABLED_RULE, TRANSLATE_SCOPE)?;
    if enabled.as_bool() != Some(true) {
        return Ok(TranslationConfig::disabled());
    }

    let migrated = migrate_legacy_endpoint(block);
    if migrated.is_some() {
        log::warn!(
            "translate.ollama_endpoint is deprecated; migrated to base_url with model_type \"ollama\". \
             Please update voice.config.json"
        );
    }
    let block = migrated.as_ref().unwrap_or(block);

    let raw_provider = require(block, TRANSLATE_PROVIDER_FIELD, TRANSLATE_SCOPE)?;
    let provider = raw_provider
        .as_str()
        .and_then(|s| s.parse::<ProviderKind>().ok())
        .ok_or_else(|| ValidationError::UnknownProvider {
            field: field_path(TRANSLATE_SCOPE, TRANSLATE_PROVIDER_FIELD),
            value: match raw_provider {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            accepted: ProviderKind::accepted_values(),
        })?;

    check_fields(block, TRANSLATE_BACKEND_FIELDS, TRANSLATE_SCOPE)?;

    if requires_api_key(provider, text(block, "base_url"))? {
        let has_key = block
            .get(TRANSLATE_API_KEY_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|key| !key.is_empty());
        if !has_key {
            return Err(ValidationError::ApiKeyRequired {
                provider: provider.to_string(),
            });
        }
    }

    let backend = TranslationBackend {
        provider,
        base_url: text(block, "base_url").to_string(),
        api_key: optional_text(block, TRANSLATE_API_KEY_FIELD),
        model_name: text(block, "model_name").to_string(),
        context_size: optional_count(block, "context_size"),
        additional_prompt: optional_text(block, "additional_prompt"),
    };

    Ok(TranslationConfig {
        enabled: true,
        backend: Some(backend),
    })
}

/// Optional backend string.  Values no rule governs are dropped with a
/// warning instead of failing the load.
fn optional_text(block: &Map<String, Value>, name: &str) -> Option<String> {
    match block.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => {
            log::warn!("ignoring {TRANSLATE_SCOPE}.{name}: expected a string, got {other}");
            None
        }
    }
}

/// Optional non-negative whole number; anything else falls back to the
/// default with a warning.
fn optional_count(block: &Map<String, Value>, name: &str) -> Option<u32> {
    let value = block.get(name).filter(|v| !v.is_null())?;
    let count = value.as_u64().and_then(|n| u32::try_from(n).ok());
    if count.is_none() {
        log::warn!("ignoring {TRANSLATE_SCOPE}.{name}: expected a whole number, got {value}");
    }
    count
}

/// Whether `provider` at `base_url` must be given an API key.
///
/// | Provider   | Key required                              |
/// |------------|-------------------------------------------|
/// | `ollama`   | only when the host is not loopback        |
/// | `custom`   | never                                     |
/// | all others | always                                    |
pub fn requires_api_key(provider: ProviderKind, base_url: &str) -> Result<bool, ValidationError> {
    match provider {
        ProviderKind::Custom => Ok(false),
        ProviderKind::Ollama => {
            let url = Url::parse(base_url).map_err(|e| ValidationError::InvalidUrl {
                field: field_path(TRANSLATE_SCOPE, "base_url"),
                value: base_url.to_string(),
                reason: e.to_string(),
            })?;
            Ok(!is_loopback(&url))
        }
        _ => Ok(true),
    }
}

/// `localhost`, `127.0.0.1` or `[::1]`.
fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr == Ipv4Addr::LOCALHOST,
        Some(Host::Ipv6(addr)) => addr == Ipv6Addr::LOCALHOST,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

fn validate_character(
    index: usize,
    entry: &Value,
    install_dir: &Path,
) -> Result<CharacterProfile, ValidationError> {
    let scope = format!("character[{index}]");
    let obj = entry.as_object().ok_or_else(|| ValidationError::WrongType {
        field: scope.clone(),
        expected: FieldKind::Table.describe(),
    })?;

    check_fields(obj, CHARACTER_FIELDS, &scope)?;
    check_paths(obj, CHARACTER_PATHS, &scope, install_dir)?;

    for name in INFERENCE_FIELDS {
        match obj.get(*name) {
            None | Some(Value::Null) => {}
            Some(params) => validate_inference(params, &scope, name)?,
        }
    }

    let mut profile: CharacterProfile =
        serde_json::from_value(entry.clone()).map_err(|e| ValidationError::Malformed {
            field: scope,
            reason: e.to_string(),
        })?;
    if let Some(params) = profile.inference.as_mut() {
        for language in [&mut params.prompt_language, &mut params.text_language] {
            if language.as_deref() == Some("") {
                *language = None;
            }
        }
    }
    Ok(profile)
}

/// Check each inference override that is set.  `null` and, for languages,
/// `""` count as unset.  Errors are reported as `character[i].<knob>`.
fn validate_inference(params: &Value, scope: &str, block: &str) -> Result<(), ValidationError> {
    let params = params.as_object().ok_or_else(|| ValidationError::WrongType {
        field: field_path(scope, block),
        expected: FieldKind::Table.describe(),
    })?;

    for name in LANGUAGE_FIELDS {
        let Some(value) = params
            .get(*name)
            .filter(|v| !v.is_null() && v.as_str() != Some(""))
        else {
            continue;
        };
        if !value.as_str().is_some_and(is_supported_language) {
            return Err(ValidationError::UnknownLanguage {
                field: field_path(scope, name),
                value: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            });
        }
    }

    for rule in INFERENCE_RANGES {
        let Some(value) = params.get(rule.field).filter(|v| !v.is_null()) else {
            continue;
        };
        let field = field_path(scope, rule.field);
        let Some(n) = value.as_f64() else {
            return Err(ValidationError::WrongType {
                field,
                expected: "a number",
            });
        };
        if !rule.contains(n) {
            return Err(ValidationError::OutOfRange {
                field,
                min: rule.min,
                max: rule.max,
                value: n,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
