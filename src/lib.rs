//! Validated access to the voice-synthesis configuration (`voice.config.json`).
//!
//! * [`config`] — loading, validation, caching and typed accessors.
//! * [`request`] — language codes and inference parameters shared with the
//!   synthesis request layer.

pub mod config;
pub mod request;
