//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/squadxp/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/squadxp/` (~/.config/squadxp/)
//! - State/Logs: `$XDG_STATE_HOME/squadxp/` (~/.local/state/squadxp/)
//!
//! Claude Code logs are read from `~/.claude/projects` unless `analysis.log_dir`
//! points somewhere else.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Log analysis configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Agent registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log analysis configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Override for the Claude Code projects directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Only analyze log files modified within the last N days (0 = no cutoff)
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// Number of entries inspected when deciding whether an invocation failed
    #[serde(default = "default_lookahead_window")]
    pub lookahead_window: usize,

    /// Maximum characters kept in `AgentInvocation::task_description`
    #[serde(default = "default_task_description_chars")]
    pub task_description_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            days_back: default_days_back(),
            lookahead_window: default_lookahead_window(),
            task_description_chars: default_task_description_chars(),
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.lookahead_window == 0 {
            return Err(Error::Config(
                "analysis.lookahead_window must be at least 1".to_string(),
            ));
        }
        if self.task_description_chars == 0 {
            return Err(Error::Config(
                "analysis.task_description_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The log directory to analyze: the override if set, else `~/.claude/projects`.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(Config::default_log_dir)
    }
}

fn default_days_back() -> u32 {
    30
}

fn default_lookahead_window() -> usize {
    5
}

fn default_task_description_chars() -> usize {
    500
}

/// Agent registry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Extra directories scanned for agent markdown files
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Seconds a discovery result stays cached
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![],
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analysis.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/squadxp/config.toml` (~/.config/squadxp/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("squadxp").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/squadxp/` (~/.local/state/squadxp/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("squadxp")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("squadxp.log")
    }

    /// Returns the default Claude Code projects directory (`~/.claude/projects`)
    pub fn default_log_dir() -> PathBuf {
        home_dir().join(".claude").join("projects")
    }

    /// Returns the default agent search directories.
    ///
    /// `./agents`, `~/.claude/agents` and `./custom_agents`, followed by any
    /// configured `registry.search_paths`.
    pub fn agent_search_paths(&self) -> Vec<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut paths = vec![
            cwd.join("agents"),
            home_dir().join(".claude").join("agents"),
            cwd.join("custom_agents"),
        ];
        for extra in &self.registry.search_paths {
            if !paths.contains(extra) {
                paths.push(extra.clone());
            }
        }
        paths
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
