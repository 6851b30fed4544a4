//! # Store Configuration
//!
//! Configuration for opening a [`Store`](crate::Store).
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SARI_TENANT_ID=aling-nena                                          │
//! │     SARI_REMOTE_MODE=offline                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sari-store/store.toml (Linux)                            │
//! │     ~/Library/Application Support/com.sari.store/store.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     RemoteMode::Mirror, 500 ms debounce, demo fallback on              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # store.toml
//! [store]
//! tenant_id = "aling-nena"
//! name = "Aling Nena's Sari-Sari"
//!
//! [local]
//! database_path = "/var/lib/sari/sari.db"
//! max_connections = 5
//!
//! [remote]
//! mode = "mirror"  # mirror | offline
//! directory = "/mnt/shared/sari"
//! debounce_ms = 500
//!
//! [startup]
//! demo_fallback = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Longest accepted mirror debounce window.
const MAX_DEBOUNCE_MS: u64 = 60_000;

// =============================================================================
// Remote Mode
// =============================================================================

/// Whether commits are mirrored to a remote document store.
///
/// ```text
/// MIRROR (Default)                    OFFLINE
/// ────────────────                    ───────
/// • Hydrates an empty local store     • Local SQLite only
///   from the remote document          • No mirror task is started
/// • Every commit is mirrored after    • Demo fallback still applies
///   the debounce window
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteMode {
    #[default]
    Mirror,
    Offline,
}

impl RemoteMode {
    /// Returns true if the remote mirror is enabled.
    pub fn is_mirror_enabled(&self) -> bool {
        matches!(self, RemoteMode::Mirror)
    }
}

impl std::fmt::Display for RemoteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteMode::Mirror => write!(f, "mirror"),
            RemoteMode::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for RemoteMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mirror" | "online" => Ok(RemoteMode::Mirror),
            "offline" | "disabled" | "local" => Ok(RemoteMode::Offline),
            other => Err(StoreError::InvalidConfig(format!(
                "Unknown remote mode: '{}'. Valid options: mirror, offline",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Identity of the store. The tenant id names the remote document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,

    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_tenant_id() -> String {
    "default".to_string()
}

fn default_store_name() -> String {
    "Sari-Sari Store".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            tenant_id: default_tenant_id(),
            name: default_store_name(),
        }
    }
}

/// Local SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSection {
    /// Database file. Defaults to `sari.db` in the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for LocalSection {
    fn default() -> Self {
        LocalSection {
            database_path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Remote mirror settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default)]
    pub mode: RemoteMode,

    /// Directory holding one `<tenant>.json` document per tenant.
    /// Defaults to `remote/` in the platform data directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Commits arriving within this window share one remote write.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for RemoteSection {
    fn default() -> Self {
        RemoteSection {
            mode: RemoteMode::default(),
            directory: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Startup behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupSection {
    /// Serve the demo ledger when neither local nor remote data exists.
    #[serde(default = "default_true")]
    pub demo_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StartupSection {
    fn default() -> Self {
        StartupSection {
            demo_fallback: default_true(),
        }
    }
}

// =============================================================================
// Main Store Configuration
// =============================================================================

/// Complete store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub local: LocalSection,

    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub startup: StartupSection,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (store.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        let tenant = self.store.tenant_id.trim();
        if tenant.is_empty() {
            return Err(StoreError::InvalidConfig("tenant_id must not be empty".into()));
        }
        // The tenant id becomes a file name in the directory store
        if tenant.contains(['/', '\\']) || tenant.starts_with('.') {
            return Err(StoreError::InvalidConfig(format!(
                "tenant_id '{}' must not contain path separators or start with '.'",
                tenant
            )));
        }

        if self.local.max_connections == 0 {
            return Err(StoreError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.remote.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(StoreError::InvalidConfig(format!(
                "debounce_ms must be at most {}",
                MAX_DEBOUNCE_MS
            )));
        }

        if self.remote.mode.is_mirror_enabled() && self.remote_directory().is_none() {
            return Err(StoreError::InvalidConfig(
                "remote.directory is required when no platform data directory exists".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("SARI_TENANT_ID") {
            debug!(tenant_id = %id, "Overriding tenant id from environment");
            self.store.tenant_id = id;
        }

        if let Some(path) = lookup("SARI_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.local.database_path = Some(PathBuf::from(path));
        }

        if let Some(mode) = lookup("SARI_REMOTE_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding remote mode from environment");
                    self.remote.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown remote mode in environment"),
            }
        }

        if let Some(dir) = lookup("SARI_REMOTE_DIR") {
            self.remote.directory = Some(PathBuf::from(dir));
        }

        if let Some(ms) = lookup("SARI_MIRROR_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.remote.debounce_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid SARI_MIRROR_DEBOUNCE_MS"),
            }
        }

        if let Some(flag) = lookup("SARI_DEMO_FALLBACK") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.startup.demo_fallback = true,
                "0" | "false" | "no" | "off" => self.startup.demo_fallback = false,
                _ => warn!(value = %flag, "Ignoring invalid SARI_DEMO_FALLBACK"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "sari", "store")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("store.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tenant_id(&self) -> &str {
        self.store.tenant_id.trim()
    }

    /// Resolved database file path.
    pub fn database_path(&self) -> PathBuf {
        self.local.database_path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("sari.db"))
                .unwrap_or_else(|| PathBuf::from("sari.db"))
        })
    }

    /// Resolved remote document directory.
    pub fn remote_directory(&self) -> Option<PathBuf> {
        self.remote
            .directory
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("remote")))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.remote.debounce_ms)
    }

    pub fn is_mirror_enabled(&self) -> bool {
        self.remote.mode.is_mirror_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with_dir() -> StoreConfig {
        let mut config = StoreConfig::default();
        config.remote.directory = Some(PathBuf::from("/tmp/sari-remote"));
        config
    }

    #[test]
    fn test_remote_mode_parsing() {
        assert_eq!("mirror".parse::<RemoteMode>().unwrap(), RemoteMode::Mirror);
        assert_eq!("OFFLINE".parse::<RemoteMode>().unwrap(), RemoteMode::Offline);
        assert_eq!("local".parse::<RemoteMode>().unwrap(), RemoteMode::Offline);
        assert!("cloud".parse::<RemoteMode>().is_err());
        assert_eq!(RemoteMode::Offline.to_string(), "offline");
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.tenant_id(), "default");
        assert_eq!(config.remote.mode, RemoteMode::Mirror);
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(config.startup.demo_fallback);
        assert_eq!(config.local.max_connections, 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = with_dir();
        assert!(config.validate().is_ok());

        config.store.tenant_id = "  ".to_string();
        assert!(config.validate().is_err());

        config.store.tenant_id = "../escape".to_string();
        assert!(config.validate().is_err());

        config.store.tenant_id = "aling-nena".to_string();
        config.remote.debounce_ms = MAX_DEBOUNCE_MS + 1;
        assert!(config.validate().is_err());

        config.remote.debounce_ms = 0;
        config.local.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SARI_TENANT_ID", "aling-nena"),
            ("SARI_DB_PATH", "/data/sari.db"),
            ("SARI_REMOTE_MODE", "offline"),
            ("SARI_MIRROR_DEBOUNCE_MS", "250"),
            ("SARI_DEMO_FALLBACK", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.tenant_id(), "aling-nena");
        assert_eq!(config.database_path(), PathBuf::from("/data/sari.db"));
        assert_eq!(config.remote.mode, RemoteMode::Offline);
        assert_eq!(config.remote.debounce_ms, 250);
        assert!(!config.startup.demo_fallback);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = StoreConfig::default();
        config.apply_overrides(|key| match key {
            "SARI_REMOTE_MODE" => Some("cloud".to_string()),
            "SARI_MIRROR_DEBOUNCE_MS" => Some("soon".to_string()),
            "SARI_DEMO_FALLBACK" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.remote.mode, RemoteMode::Mirror);
        assert_eq!(config.remote.debounce_ms, 500);
        assert!(config.startup.demo_fallback);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            [store]
            tenant_id = "tindahan"

            [remote]
            mode = "offline"
            "#,
        )
        .unwrap();

        assert_eq!(config.tenant_id(), "tindahan");
        assert_eq!(config.store.name, "Sari-Sari Store");
        assert_eq!(config.remote.mode, RemoteMode::Offline);
        assert_eq!(config.remote.debounce_ms, 500);
        assert!(config.startup.demo_fallback);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.toml");

        let mut config = with_dir();
        config.store.tenant_id = "tindahan".to_string();
        config.remote.debounce_ms = 1200;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: StoreConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.tenant_id(), "tindahan");
        assert_eq!(loaded.remote.debounce_ms, 1200);
        assert_eq!(loaded.remote.directory, config.remote.directory);
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "[remote]\nmode = 42\n").unwrap();

        let config = StoreConfig::load_or_default(Some(path));
        assert_eq!(config.remote.mode, RemoteMode::Mirror);
    }
}
