//! Configuration module for the voice code assistant.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the backend and
//! editor, `AppPaths` for cross-platform config directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, BackendConfig, EditorConfig, BACKEND_URL_ENV};
