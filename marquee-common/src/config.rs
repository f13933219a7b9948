//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority, clap also folds in env vars)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "MARQUEE_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "marquee.db";

/// Compiled-in defaults
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_SETTINGS_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 4 * 60 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Default embed-host substrings for the playback surface allowlist
pub fn default_embed_hosts() -> Vec<String> {
    vec!["embed".to_string(), "player".to_string()]
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub settings_cache_ttl_secs: Option<u64>,
    pub session_idle_timeout_secs: Option<u64>,
    pub max_sessions: Option<usize>,
    pub embed_hosts: Option<Vec<String>>,
    pub admin_token: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load the config file from `explicit` or the platform search path.
    ///
    /// A missing file is not an error: defaults apply. A file that exists but
    /// fails to parse is logged and ignored so startup never stops on it.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let Some(path) = path else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    info!("Loaded config file: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{} ({}), using defaults", e, path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read config file {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Values supplied on the command line (or via clap `env` fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub settings_cache_ttl_secs: Option<u64>,
    pub admin_token: Option<String>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub settings_cache_ttl_secs: u64,
    pub session_idle_timeout_secs: u64,
    /// Live playback sessions kept before the least recently used is evicted
    pub max_sessions: usize,
    pub embed_hosts: Vec<String>,
    /// Bearer token for settings writes. `None` leaves them unauthenticated.
    pub admin_token: Option<String>,
}

impl ServerConfig {
    /// Merge CLI overrides over the TOML file over compiled defaults
    pub fn resolve(cli: CliOverrides, file: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(
            cli.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            file.root_folder.as_deref(),
        );

        Self {
            root_folder,
            bind_addr: cli
                .bind_addr
                .or(file.bind_addr)
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            settings_cache_ttl_secs: cli
                .settings_cache_ttl_secs
                .or(file.settings_cache_ttl_secs)
                .unwrap_or(DEFAULT_SETTINGS_CACHE_TTL_SECS),
            session_idle_timeout_secs: file
                .session_idle_timeout_secs
                .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
            max_sessions: file
                .max_sessions
                .filter(|max| *max > 0)
                .unwrap_or(DEFAULT_MAX_SESSIONS),
            embed_hosts: file
                .embed_hosts
                .filter(|hosts| !hosts.is_empty())
                .unwrap_or_else(default_embed_hosts),
            admin_token: cli
                .admin_token
                .or(file.admin_token)
                .filter(|token| !token.trim().is_empty()),
        }
    }

    /// Path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    /// `host:port` listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Create the root folder if it doesn't exist
    pub fn ensure_root_folder(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }
}

/// Root folder resolution: CLI argument, then environment, then config file,
/// then the OS-dependent default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    default_root_folder()
}

/// Locate `config.toml` on this platform
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("marquee").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/marquee/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/marquee"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/marquee"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\marquee"))
    } else {
        PathBuf::from("./marquee_data")
    }
}
