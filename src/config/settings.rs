//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable that overrides [`BackendConfig::base_url`].
pub const BACKEND_URL_ENV: &str = "VOICE_CODE_BACKEND_URL";

const DEFAULT_INITIAL_CODE: &str =
    "def greet(name):\n    print(f\"Hello, {name}!\")\n\ngreet(\"World\")";

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Connection settings for the code-generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Use the chat endpoints (`/chat-message`, `/chats`).  When `false`
    /// requests go to `/code-assistant` and nothing is persisted server-side.
    pub persistence_enabled: bool,
    /// Maximum seconds to wait for a code-generation or history request.
    pub request_timeout_secs: u64,
    /// Maximum seconds to wait for the startup reachability probe.
    pub probe_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            persistence_enabled: true,
            request_timeout_secs: 120,
            probe_timeout_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// EditorConfig
// ---------------------------------------------------------------------------

/// Settings for the code editor buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Buffer contents at startup.
    pub initial_code: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            initial_code: DEFAULT_INITIAL_CODE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_code_assistant::config::{AppConfig, AppPaths};
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Write it back
/// config.save_to(&AppPaths::new().settings_file).unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection settings.
    pub backend: BackendConfig,
    /// Editor buffer settings.
    pub editor: EditorConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path` (normally [`AppPaths::settings_file`]), creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply the [`BACKEND_URL_ENV`] override, if set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_backend_url(std::env::var(BACKEND_URL_ENV).ok())
    }

    fn with_backend_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.backend.base_url = url;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
