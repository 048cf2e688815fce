pub mod audio;
pub mod config;
pub mod models;
pub mod output;
pub mod transcribe;

/// Route whisper.cpp and GGML logs through tracing. Call once at startup,
/// before the first model load, so load-time output obeys the log filter.
pub use whisper_rs::install_logging_hooks;
