//! Location of `voice.config.json`.
//!
//! Hosts normally pass their own working directory.  When they don't, the
//! platform config directory is used (via the `dirs` crate):
//!
//!   Windows: %APPDATA%\voice-config\
//!   macOS:   ~/Library/Application Support/voice-config/
//!   Linux:   ~/.config/voice-config/

use std::path::{Path, PathBuf};

/// File name of the voice configuration inside the working directory.
pub const CONFIG_FILE_NAME: &str = "voice.config.json";

/// Resolved working directory and config file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePaths {
    /// Directory that holds `voice.config.json`.
    pub work_dir: PathBuf,
    /// Full path to `voice.config.json`.
    pub config_file: PathBuf,
}

impl VoicePaths {
    const APP_NAME: &'static str = "voice-config";

    /// Resolves the platform default working directory.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// config directory.
    pub fn new() -> Self {
        let work_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        Self::in_dir(work_dir)
    }

    /// Layout rooted at an explicit working directory.
    pub fn in_dir(work_dir: impl AsRef<Path>) -> Self {
        let work_dir = work_dir.as_ref().to_path_buf();
        let config_file = work_dir.join(CONFIG_FILE_NAME);
        Self {
            work_dir,
            config_file,
        }
    }
}

impl Default for VoicePaths {
    fn default() -> Self {
        Self::new()
    }
}
