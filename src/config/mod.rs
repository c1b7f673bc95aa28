//! Voice configuration module.
//!
//! Provides [`VoiceConfigManager`] (lazy, cached access to
//! `voice.config.json`), the validated value types ([`RootConfig`],
//! [`TranslationConfig`], [`CharacterProfile`]), the fail-fast
//! [`validate`] pass, and [`VoicePaths`] for the default file location.

pub mod error;
pub mod manager;
pub mod migrate;
pub mod paths;
pub mod schema;
pub mod validate;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::{ConfigError, ValidationError};
pub use manager::VoiceConfigManager;
pub use paths::{VoicePaths, CONFIG_FILE_NAME};
pub use schema::{
    CharacterProfile, ProviderKind, RootConfig, TranslationBackend, TranslationConfig,
    DEFAULT_CONTEXT_SIZE,
};
pub use validate::{requires_api_key, validate};
