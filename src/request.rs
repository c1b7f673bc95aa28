//! Synthesis request vocabulary shared with the configuration layer.
//!
//! The GPT-SoVITS service accepts a fixed set of language codes for the
//! reference prompt and the text to synthesise.  [`LANGUAGE_OPTIONS`] is the
//! authoritative table; the config validator only checks membership.
//!
//! [`InferenceParameters`] is the optional per-character override block.  All
//! fields are optional so a character can override only what it needs.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Language table
// ---------------------------------------------------------------------------

/// Supported language codes and their human-readable description.
///
/// | Code       | Meaning                                  |
/// |------------|------------------------------------------|
/// | `all_*`    | Whole text in that language              |
/// | `zh`/`ja`… | That language mixed with English         |
/// | `auto*`    | Multilingual, detected per segment       |
pub const LANGUAGE_OPTIONS: &[(&str, &str)] = &[
    ("all_zh", "Chinese"),
    ("en", "English"),
    ("all_ja", "Japanese"),
    ("all_yue", "Cantonese"),
    ("all_ko", "Korean"),
    ("zh", "Chinese-English mixed"),
    ("ja", "Japanese-English mixed"),
    ("yue", "Cantonese-English mixed"),
    ("ko", "Korean-English mixed"),
    ("auto", "Multilingual mixed"),
    ("auto_yue", "Multilingual mixed (Cantonese)"),
];

/// Returns `true` when `code` is a key of [`LANGUAGE_OPTIONS`].
pub fn is_supported_language(code: &str) -> bool {
    LANGUAGE_OPTIONS.iter().any(|(key, _)| *key == code)
}

/// Description for a supported language code, or `None` when unknown.
pub fn language_description(code: &str) -> Option<&'static str> {
    LANGUAGE_OPTIONS
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, desc)| *desc)
}

// ---------------------------------------------------------------------------
// InferenceParameters
// ---------------------------------------------------------------------------

/// Per-invocation generation knobs.
///
/// Valid ranges (enforced at config load time):
///
/// | Field         | Range        |
/// |---------------|--------------|
/// | `top_k`       | 1 – 100      |
/// | `top_p`       | 0.0 – 1.0    |
/// | `temperature` | 0.0 – 1.0    |
/// | `speed`       | 0.6 – 1.65   |
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceParameters {
    /// Language of the reference transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_language: Option<String>,
    /// Language of the text being synthesised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_language: Option<String>,
    /// Any number in range, fractional values included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Playback speed factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl InferenceParameters {
    /// Stock values used by the synthesis service when a request omits them.
    pub fn service_defaults() -> Self {
        Self {
            prompt_language: Some("auto".into()),
            text_language: Some("auto".into()),
            top_k: Some(5.0),
            top_p: Some(1.0),
            temperature: Some(1.0),
            speed: Some(1.0),
        }
    }

    /// Overlay `self` on top of `base`: every field set here wins, every
    /// unset field falls back to `base`.
    pub fn merged_over(&self, base: &InferenceParameters) -> InferenceParameters {
        InferenceParameters {
            prompt_language: self
                .prompt_language
                .clone()
                .or_else(|| base.prompt_language.clone()),
            text_language: self
                .text_language
                .clone()
                .or_else(|| base.text_language.clone()),
            top_k: self.top_k.or(base.top_k),
            top_p: self.top_p.or(base.top_p),
            temperature: self.temperature.or(base.temperature),
            speed: self.speed.or(base.speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_membership() {
        assert!(is_supported_language("all_ja"));
        assert!(is_supported_language("auto_yue"));
        assert!(!is_supported_language("fr"));
        assert!(!is_supported_language("ALL_JA"));
        assert_eq!(language_description("en"), Some("English"));
        assert_eq!(language_description("xx"), None);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let overrides = InferenceParameters {
            text_language: Some("all_ja".into()),
            speed: Some(1.2),
            ..InferenceParameters::default()
        };
        let merged = overrides.merged_over(&InferenceParameters::service_defaults());

        assert_eq!(merged.text_language.as_deref(), Some("all_ja"));
        assert_eq!(merged.prompt_language.as_deref(), Some("auto"));
        assert_eq!(merged.speed, Some(1.2));
        assert_eq!(merged.top_k, Some(5.0));
    }

    #[test]
    fn unset_fields_are_omitted_from_json() {
        let params = InferenceParameters {
            top_k: Some(10.0),
            ..InferenceParameters::default()
        };
        let json = serde_json::to_value(&params).expect("serialise");
        assert_eq!(json, serde_json::json!({ "top_k": 10.0 }));
    }
}
