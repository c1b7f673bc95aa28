//! Lazy, cached access to `voice.config.json`.
//!
//! [`VoiceConfigManager`] owns one cache slot.  The first accessor call reads,
//! parses and validates the whole file; every later call is served from the
//! cache until [`reload`](VoiceConfigManager::reload) discards it.
//!
//! ```rust,no_run
//! use voice_config::config::VoiceConfigManager;
//!
//! let mut voices = VoiceConfigManager::new("/srv/bot");
//! if let Some(alice) = voices.character("alice")? {
//!     println!("{} -> {}", alice.name, alice.ref_audio.display());
//! }
//! # Ok::<(), voice_config::config::ConfigError>(())
//! ```
//!
//! All accessors take `&mut self` because they may populate the cache.  Wrap
//! the manager in a `Mutex` to share it between threads.

use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::paths::VoicePaths;
use super::schema::{CharacterProfile, RootConfig, TranslationConfig};

impl RootConfig {
    /// Read, parse and validate the file at `path` without caching.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_config(path.as_ref())
    }
}

fn read_config(path: &Path) -> Result<RootConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = RootConfig::from_json_str(&content)?;

    log::info!("Loaded voice config: {}", path.display());
    log::info!("{} character(s) configured", config.characters.len());
    Ok(config)
}

// ---------------------------------------------------------------------------
// VoiceConfigManager
// ---------------------------------------------------------------------------

/// Owner of one voice config file and its validated, cached contents.
#[derive(Debug)]
pub struct VoiceConfigManager {
    config_path: PathBuf,
    cache: Option<RootConfig>,
}

impl VoiceConfigManager {
    /// Manager for `<work_dir>/voice.config.json`.
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self::from_path(VoicePaths::in_dir(work_dir).config_file)
    }

    /// Manager for an explicit config file.
    pub fn from_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            cache: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Return the cached config, loading and validating it first if needed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] — no file at [`config_path`](Self::config_path).
    /// - [`ConfigError::Read`] — the file could not be read.
    /// - [`ConfigError::Parse`] — the file is not valid JSON.
    /// - [`ConfigError::Validation`] — the first violated schema rule.
    ///
    /// On error the cache stays empty.
    pub fn load(&mut self) -> Result<&RootConfig, ConfigError> {
        let config = match self.cache.take() {
            Some(cached) => {
                log::debug!("voice config served from cache");
                cached
            }
            None => read_config(&self.config_path)?,
        };
        Ok(&*self.cache.insert(config))
    }

    /// Drop the cached config and load the file again.
    pub fn reload(&mut self) -> Result<&RootConfig, ConfigError> {
        self.cache = None;
        self.load()
    }

    /// `true` once a load has succeeded and until the next reload.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    /// Path of the config file.  Never triggers a load.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    // -----------------------------------------------------------------------
    // Characters
    // -----------------------------------------------------------------------

    /// First character named `name`, or `None` when there is no match.
    pub fn character(&mut self, name: &str) -> Result<Option<&CharacterProfile>, ConfigError> {
        Ok(self.load()?.character(name))
    }

    /// All character names in file order, duplicates included.
    pub fn character_names(&mut self) -> Result<Vec<&str>, ConfigError> {
        Ok(self.load()?.character_names())
    }

    pub fn has_character(&mut self, name: &str) -> Result<bool, ConfigError> {
        Ok(self.character(name)?.is_some())
    }

    /// Translation target of `name`; `None` when the character is unknown or
    /// has no target.
    pub fn character_translation_target(
        &mut self,
        name: &str,
    ) -> Result<Option<&str>, ConfigError> {
        Ok(self
            .character(name)?
            .and_then(CharacterProfile::translation_target))
    }

    // -----------------------------------------------------------------------
    // Global settings
    // -----------------------------------------------------------------------

    pub fn default_volume(&mut self) -> Result<f64, ConfigError> {
        Ok(self.load()?.volume)
    }

    pub fn synthesis_service_url(&mut self) -> Result<&str, ConfigError> {
        Ok(&self.load()?.synthesis_service_url)
    }

    pub fn synthesis_service_path(&mut self) -> Result<&Path, ConfigError> {
        Ok(&self.load()?.synthesis_service_path)
    }

    pub fn model_version(&mut self) -> Result<&str, ConfigError> {
        Ok(&self.load()?.model_version)
    }

    pub fn translation_config(&mut self) -> Result<&TranslationConfig, ConfigError> {
        Ok(&self.load()?.translation)
    }

    pub fn is_translation_enabled(&mut self) -> Result<bool, ConfigError> {
        Ok(self.load()?.translation.enabled)
    }
}

impl Default for VoiceConfigManager {
    /// Manager for the platform default location (see [`VoicePaths::new`]).
    fn default() -> Self {
        Self::from_path(VoicePaths::new().config_file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ValidationError;
    use crate::config::fixture::{captured_logs, Fixture};
    use crate::config::schema::ProviderKind;
    use serde_json::json;

    fn manager_for(fx: &Fixture) -> VoiceConfigManager {
        VoiceConfigManager::new(fx.work_dir())
    }

    #[test]
    fn config_path_does_not_load() {
        let fx = Fixture::new();
        let manager = manager_for(&fx);
        assert_eq!(manager.config_path(), fx.config_path());
        assert!(!manager.is_loaded());
    }

    #[test]
    fn default_manager_uses_platform_location() {
        let manager = VoiceConfigManager::default();
        assert_eq!(manager.config_path(), VoicePaths::new().config_file);
    }

    #[test]
    fn missing_file_is_not_found() {
        let fx = Fixture::new();
        let mut manager = manager_for(&fx);
        let err = manager.load().unwrap_err();

        assert!(matches!(&err, ConfigError::NotFound { path } if *path == fx.config_path()));
        assert!(err
            .to_string()
            .contains(&fx.config_path().display().to_string()));
        assert!(!manager.is_loaded());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let fx = Fixture::new();
        std::fs::write(fx.config_path(), "{ not json").expect("write");
        let mut manager = manager_for(&fx);
        assert!(matches!(manager.load().unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn validation_error_leaves_cache_empty() {
        let fx = Fixture::new();
        let mut doc = fx.document();
        doc["volume"] = json!(-1);
        fx.write(&doc);

        let mut manager = manager_for(&fx);
        let err = manager.load().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ValidationError::NotPositive { .. })
        ));
        assert!(!manager.is_loaded());
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let fx = Fixture::new();
        fx.write(&fx.document());
        let mut manager = manager_for(&fx);

        let first: *const RootConfig = manager.load().expect("load");
        let snapshot = manager.load().expect("load").clone();

        let mut changed = fx.document();
        changed["volume"] = json!(0.3);
        fx.write(&changed);

        let second: *const RootConfig = manager.load().expect("load");
        assert!(std::ptr::eq(first, second));
        assert_eq!(manager.default_volume().expect("volume"), 0.8);
        assert_eq!(*manager.load().expect("load"), snapshot);
    }

    #[test]
    fn load_summary_is_logged_once_per_read() {
        let fx = Fixture::new();
        fx.write(&fx.document());
        let mut manager = manager_for(&fx);

        let ((), logs) = captured_logs(|| {
            manager.load().expect("load");
            manager.load().expect("cached");
        });
        let summaries = logs
            .iter()
            .filter(|(level, msg)| *level == log::Level::Info && msg == "2 character(s) configured")
            .count();
        assert_eq!(summaries, 1, "{logs:?}");
        assert!(logs
            .iter()
            .any(|(level, msg)| *level == log::Level::Debug && msg.contains("from cache")));
    }

    #[test]
    fn reload_picks_up_changes() {
        let fx = Fixture::new();
        fx.write(&fx.document());
        let mut manager = manager_for(&fx);
        assert_eq!(manager.model_version().expect("version"), "v2");

        let mut changed = fx.document();
        changed["model_version"] = json!("v4");
        changed["volume"] = json!(1.5);
        fx.write(&changed);

        let reloaded = manager.reload().expect("reload");
        assert_eq!(reloaded.model_version, "v4");
        assert_eq!(manager.default_volume().expect("volume"), 1.5);
    }

    #[test]
    fn failed_reload_discards_cache() {
        let fx = Fixture::new();
        fx.write(&fx.document());
        let mut manager = manager_for(&fx);
        manager.load().expect("load");

        std::fs::remove_file(fx.config_path()).expect("remove");
        assert!(matches!(
            manager.reload().unwrap_err(),
            ConfigError::NotFound { .. }
        ));
        assert!(!manager.is_loaded());
    }

    #[test]
    fn global_accessors_project_fields() {
        let fx = Fixture::new();
        fx.write(&fx.document());
        let mut manager = manager_for(&fx);

        assert_eq!(manager.default_volume().expect("volume"), 0.8);
        assert_eq!(
            manager.synthesis_service_url().expect("url"),
            "http://127.0.0.1:9880"
        );
        assert_eq!(
            manager.synthesis_service_path().expect("path"),
            fx.install_dir()
        );
        assert_eq!(manager.model_version().expect("version"), "v2");
        assert!(!manager.is_translation_enabled().expect("translate"));
        assert!(manager
            .translation_config()
            .expect("translate")
            .backend
            .is_none());
        assert!(manager.is_loaded());
    }

    #[test]
    fn accessor_triggers_load() {
        let fx = Fixture::new();
        fx.write(&fx.document());
        let mut manager = manager_for(&fx);
        assert!(manager.has_character("alice").expect("lookup"));
        assert!(manager.is_loaded());
    }

    #[test]
    fn translation_accessors_after_migration() {
        let fx = Fixture::new();
        let mut doc = fx.document();
        doc["translate"] = json!({
            "enabled": true,
            "ollama_endpoint": "http://localhost:11434",
            "model_name": "qwen2.5:7b"
        });
        fx.write(&doc);

        let mut manager = manager_for(&fx);
        assert!(manager.is_translation_enabled().expect("translate"));
        let backend = manager
            .translation_config()
            .expect("translate")
            .backend
            .clone()
            .expect("backend");
        assert_eq!(backend.provider, ProviderKind::Ollama);
        assert_eq!(backend.base_url, "http://localhost:11434");
    }

    #[test]
    fn character_lookup() {
        let fx = Fixture::new();
        let doc = fx.document();
        fx.write(&doc);
        let mut manager = manager_for(&fx);

        assert!(manager.character("unknown").expect("lookup").is_none());
        assert!(!manager.has_character("unknown").expect("lookup"));

        let expected: CharacterProfile =
            serde_json::from_value(doc["characters"][1].clone()).expect("profile");
        assert_eq!(manager.character("bob").expect("lookup"), Some(&expected));
        assert_eq!(
            manager.character_names().expect("names"),
            vec!["alice", "bob"]
        );
    }

    #[test]
    fn duplicate_names_resolve_to_first_entry() {
        let fx = Fixture::new();
        let mut doc = fx.document();
        let mut twin = fx.character("alice");
        twin["ref_text"] = json!("second alice");
        doc["characters"]
            .as_array_mut()
            .expect("array")
            .push(twin);
        fx.write(&doc);

        let mut manager = manager_for(&fx);
        assert_eq!(
            manager.character_names().expect("names"),
            vec!["alice", "bob", "alice"]
        );
        let alice = manager.character("alice").expect("lookup").expect("alice");
        assert_eq!(alice.ref_text, "This is alice speaking.");
    }

    #[test]
    fn character_translation_target() {
        let fx = Fixture::new();
        let mut doc = fx.document();
        doc["characters"][0]["translate_to"] = json!("ja");
        fx.write(&doc);
        let mut manager = manager_for(&fx);

        assert_eq!(
            manager.character_translation_target("alice").expect("target"),
            Some("ja")
        );
        assert_eq!(
            manager.character_translation_target("bob").expect("target"),
            None
        );
        assert_eq!(
            manager.character_translation_target("nobody").expect("target"),
            None
        );
    }

    #[test]
    fn independent_managers_do_not_share_cache() {
        let first = Fixture::new();
        let second = Fixture::new();
        first.write(&first.document());
        let mut doc = second.document();
        doc["model_version"] = json!("v3");
        second.write(&doc);

        let mut a = manager_for(&first);
        let mut b = manager_for(&second);
        assert_eq!(a.model_version().expect("version"), "v2");
        assert_eq!(b.model_version().expect("version"), "v3");

        b.reload().expect("reload");
        assert_eq!(a.model_version().expect("version"), "v2");
    }

    #[test]
    fn from_file_validates_without_manager() {
        let fx = Fixture::new();
        let path = fx.write(&fx.document());
        let config = RootConfig::from_file(&path).expect("load");
        assert_eq!(config.characters.len(), 2);
    }
}
