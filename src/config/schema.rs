//! Typed configuration values and the declarative rule tables that describe
//! the on-disk `voice.config.json` shape.
//!
//! The value structs ([`RootConfig`], [`TranslationConfig`],
//! [`CharacterProfile`]) are only ever produced by the validator and are
//! immutable afterwards.  The rule tables ([`FieldRule`], [`PathRule`],
//! [`RangeRule`]) are consumed by [`crate::config::validate`] and double as
//! the source for error messages.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::request::InferenceParameters;

/// Number of previous lines sent to the translation backend as context when
/// `translate.context_size` is not set.
pub const DEFAULT_CONTEXT_SIZE: u32 = 2;

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Translation backend flavour (`translate.model_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local LLM served by Ollama.  Needs no API key on a loopback host.
    Ollama,
    OpenAi,
    Anthropic,
    Google,
    Mistral,
    Cohere,
    /// Self-hosted or otherwise unlisted backend.  Never needs an API key.
    Custom,
}

impl ProviderKind {
    /// Every accepted value, in the order they are listed in error messages.
    pub const ALL: [ProviderKind; 7] = [
        Self::Ollama,
        Self::OpenAi,
        Self::Anthropic,
        Self::Google,
        Self::Mistral,
        Self::Cohere,
        Self::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Mistral => "mistral",
            Self::Cohere => "cohere",
            Self::Custom => "custom",
        }
    }

    /// Comma-separated list of accepted values.
    pub fn accepted_values() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Connection settings of an enabled translation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationBackend {
    #[serde(rename = "model_type")]
    pub provider: ProviderKind,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model_name: String,
    /// Number of previous lines passed as context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_size: Option<u32>,
    /// Extra instructions appended to the translation prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_prompt: Option<String>,
}

impl TranslationBackend {
    /// Configured context size, or [`DEFAULT_CONTEXT_SIZE`].
    pub fn context_size(&self) -> u32 {
        self.context_size.unwrap_or(DEFAULT_CONTEXT_SIZE)
    }
}

/// The `translate` block.
///
/// When `enabled` is `false` the remaining fields are never inspected and
/// `backend` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<TranslationBackend>,
}

impl TranslationConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            backend: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CharacterProfile
// ---------------------------------------------------------------------------

/// One character's voice models and synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    #[serde(rename = "character_name")]
    pub name: String,
    /// GPT model file, relative to the GPT-SoVITS install directory.
    #[serde(rename = "gpt")]
    pub gpt_model: PathBuf,
    /// SoVITS model file, relative to the GPT-SoVITS install directory.
    #[serde(rename = "sovits")]
    pub sovits_model: PathBuf,
    /// Reference audio clip, used as given.
    pub ref_audio: PathBuf,
    /// Transcript of `ref_audio`.
    pub ref_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_to: Option<String>,
    #[serde(
        default,
        rename = "inferrence_config",
        alias = "inference_config",
        skip_serializing_if = "Option::is_none"
    )]
    pub inference: Option<InferenceParameters>,
}

impl CharacterProfile {
    pub fn gpt_model_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.gpt_model)
    }

    pub fn sovits_model_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.sovits_model)
    }

    /// Target language for translated lines.  An empty string counts as
    /// "no translation".
    pub fn translation_target(&self) -> Option<&str> {
        self.translate_to.as_deref().filter(|lang| !lang.is_empty())
    }
}

// ---------------------------------------------------------------------------
// RootConfig
// ---------------------------------------------------------------------------

/// Fully validated `voice.config.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootConfig {
    /// Playback volume.
    pub volume: f64,
    /// Base URL of the GPT-SoVITS API server.
    #[serde(rename = "gpt_sovits_url")]
    pub synthesis_service_url: String,
    /// GPT-SoVITS install directory; model paths are resolved against it.
    #[serde(rename = "gpt_sovits_path")]
    pub synthesis_service_path: PathBuf,
    pub model_version: String,
    #[serde(rename = "translate")]
    pub translation: TranslationConfig,
    pub characters: Vec<CharacterProfile>,
}

impl RootConfig {
    /// First character named `name`.  Later duplicates are shadowed.
    pub fn character(&self, name: &str) -> Option<&CharacterProfile> {
        self.characters.iter().find(|c| c.name == name)
    }

    pub fn character_names(&self) -> Vec<&str> {
        self.characters.iter().map(|c| c.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// JSON shape a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string.
    Text,
    /// Number strictly greater than zero.
    PositiveNumber,
    Flag,
    List,
    Table,
}

impl FieldKind {
    /// Phrase used in "must be ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Text => "a non-empty string",
            Self::PositiveNumber => "a positive number",
            Self::Flag => "a boolean",
            Self::List => "an array",
            Self::Table => "an object",
        }
    }
}

/// A required field and its expected shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule { name, kind }
}

/// How a path-valued field is resolved before the existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathBase {
    AsGiven,
    /// Joined onto `gpt_sovits_path`.
    InstallDir,
}

/// A string field that must name an existing filesystem entry.
#[derive(Debug, Clone, Copy)]
pub struct PathRule {
    pub field: &'static str,
    pub base: PathBase,
}

/// Closed numeric range for an optional inference knob.
#[derive(Debug, Clone, Copy)]
pub struct RangeRule {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl RangeRule {
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const VOLUME_RULE: FieldRule = required("volume", FieldKind::PositiveNumber);

/// Synthesis service location.  The install directory must exist before
/// `model_version` is looked at.
pub const SERVICE_FIELDS: &[FieldRule] = &[
    required("gpt_sovits_url", FieldKind::Text),
    required("gpt_sovits_path", FieldKind::Text),
];
pub const SERVICE_PATHS: &[PathRule] = &[PathRule {
    field: "gpt_sovits_path",
    base: PathBase::AsGiven,
}];

pub const MODEL_VERSION_RULE: FieldRule = required("model_version", FieldKind::Text);

pub const TRANSLATE_RULE: FieldRule = required("translate", FieldKind::Table);
pub const CHARACTERS_RULE: FieldRule = required("characters", FieldKind::List);

pub const TRANSLATE_ENABLED_RULE: FieldRule = required("enabled", FieldKind::Flag);
pub const TRANSLATE_PROVIDER_FIELD: &str = "model_type";
pub const TRANSLATE_BACKEND_FIELDS: &[FieldRule] = &[
    required("base_url", FieldKind::Text),
    required("model_name", FieldKind::Text),
];
pub const TRANSLATE_API_KEY_FIELD: &str = "api_key";
/// Pre-`base_url` name of the Ollama endpoint.
pub const LEGACY_ENDPOINT_FIELD: &str = "ollama_endpoint";

pub const CHARACTER_FIELDS: &[FieldRule] = &[
    required("character_name", FieldKind::Text),
    required("gpt", FieldKind::Text),
    required("sovits", FieldKind::Text),
    required("ref_audio", FieldKind::Text),
    required("ref_text", FieldKind::Text),
];

pub const CHARACTER_PATHS: &[PathRule] = &[
    PathRule {
        field: "gpt",
        base: PathBase::InstallDir,
    },
    PathRule {
        field: "sovits",
        base: PathBase::InstallDir,
    },
    PathRule {
        field: "ref_audio",
        base: PathBase::AsGiven,
    },
];

/// Key names accepted for the per-character inference block.
pub const INFERENCE_FIELDS: &[&str] = &["inferrence_config", "inference_config"];
pub const LANGUAGE_FIELDS: &[&str] = &["prompt_language", "text_language"];

pub const INFERENCE_RANGES: &[RangeRule] = &[
    RangeRule {
        field: "top_k",
        min: 1.0,
        max: 100.0,
    },
    RangeRule {
        field: "top_p",
        min: 0.0,
        max: 1.0,
    },
    RangeRule {
        field: "temperature",
        min: 0.0,
        max: 1.0,
    },
    RangeRule {
        field: "speed",
        min: 0.6,
        max: 1.65,
    },
];
