//! Test-only on-disk fixture: a fake GPT-SoVITS install directory with model
//! weights and reference clips, plus helpers that emit matching JSON.
//!
//! [`captured_logs`] records what the library logs on the calling thread.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

use super::paths::CONFIG_FILE_NAME;

pub struct Fixture {
    dir: TempDir,
    install_dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempdir().expect("temp dir");
        let install_dir = dir.path().join("GPT-SoVITS");
        std::fs::create_dir_all(&install_dir).expect("install dir");
        Self { dir, install_dir }
    }

    /// Working directory that holds `voice.config.json`.
    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(CONFIG_FILE_NAME)
    }

    /// Create `rel` (and its parents) under `root` and return the full path.
    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("parent dir");
        }
        std::fs::write(&path, b"stub").expect("write stub");
        path
    }

    /// A character entry whose model and audio files all exist.
    pub fn character(&self, name: &str) -> Value {
        let gpt = format!("GPT_weights_v2/{name}-e15.ckpt");
        let sovits = format!("SoVITS_weights_v2/{name}_e8_s200.pth");
        Self::touch(&self.install_dir, &gpt);
        Self::touch(&self.install_dir, &sovits);
        let ref_audio = Self::touch(self.dir.path(), &format!("ref/{name}.wav"));

        json!({
            "character_name": name,
            "gpt": gpt,
            "sovits": sovits,
            "ref_audio": ref_audio,
            "ref_text": format!("This is {name} speaking."),
        })
    }

    /// A complete valid document with two characters and translation off.
    pub fn document(&self) -> Value {
        json!({
            "volume": 0.8,
            "gpt_sovits_url": "http://127.0.0.1:9880",
            "gpt_sovits_path": self.install_dir,
            "model_version": "v2",
            "translate": { "enabled": false },
            "characters": [self.character("alice"), self.character("bob")],
        })
    }

    /// Serialise `document` to `voice.config.json` in the work dir.
    pub fn write(&self, document: &Value) -> PathBuf {
        let path = self.config_path();
        let text = serde_json::to_string_pretty(document).expect("serialise");
        std::fs::write(&path, text).expect("write config");
        path
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED.with(|buf| {
            buf.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Run `f` and return its result with every record it logged on this thread.
/// Tests run on separate threads, so captures do not mix.
pub fn captured_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(log::Level, String)>) {
    // Only the first call installs the logger; the others see `Err`.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Trace);

    CAPTURED.with(|buf| buf.borrow_mut().clear());
    let out = f();
    (out, CAPTURED.with(RefCell::take))
}
