//! Configuration management with layered hierarchy
//!
//! Layers, later wins: built-in defaults, the global user file
//! (`<config_dir>/sect/config.yaml`), the workspace file
//! (`.sect/config.yaml`), then `SECT_*` environment variables. Command-line
//! flags are applied last by the commands that accept them.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::diagnostics::YamlSyntaxError;
use crate::core::workspace::Workspace;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

/// How `/chat` produces answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Canned keyword routing, no network
    #[default]
    Mock,
    /// Forward requests to `chat.upstream`
    Proxy,
}

impl std::str::FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ChatMode::Mock),
            "proxy" => Ok(ChatMode::Proxy),
            _ => Err(format!("Invalid chat mode: {}. Use mock or proxy", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSettings {
    pub bind: String,
    pub cors: bool,
    pub public_url: String,
    pub enforce_roles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSettings {
    pub mode: ChatMode,
    pub upstream: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalSettings {
    pub default_expiry_days: i64,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub server: ServerSettings,
    pub log: LogSettings,
    pub chat: ChatSettings,
    pub portal: PortalSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            server: ServerSettings {
                bind: DEFAULT_BIND.to_string(),
                cors: true,
                public_url: DEFAULT_PUBLIC_URL.to_string(),
                enforce_roles: false,
            },
            log: LogSettings {
                level: "info".to_string(),
                json: false,
            },
            chat: ChatSettings {
                mode: ChatMode::Mock,
                upstream: None,
                timeout_secs: 60,
            },
            portal: PortalSettings {
                default_expiry_days: 30,
            },
        }
    }
}

/// One config file as written on disk; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub database: Option<PathBuf>,
    pub server: Option<ServerLayer>,
    pub log: Option<LogLayer>,
    pub chat: Option<ChatLayer>,
    pub portal: Option<PortalLayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerLayer {
    pub bind: Option<String>,
    pub cors: Option<bool>,
    pub public_url: Option<String>,
    pub enforce_roles: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogLayer {
    pub level: Option<String>,
    pub json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatLayer {
    pub mode: Option<ChatMode>,
    pub upstream: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalLayer {
    pub default_expiry_days: Option<i64>,
}

impl Config {
    /// Load configuration from all sources for the given workspace
    pub fn load(workspace: Option<&Workspace>) -> Result<Self, ConfigError> {
        Self::load_with(workspace, Self::global_config_path().as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Load with an explicit global file and environment source
    pub fn load_with(
        workspace: Option<&Workspace>,
        global: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = global {
            if path.exists() {
                config.merge(read_layer(path)?, None);
            }
        }

        if let Some(ws) = workspace {
            let path = ws.config_path();
            if path.exists() {
                config.merge(read_layer(&path)?, Some(ws.root()));
            }
        }

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sect")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge a file layer into this config; relative database paths resolve
    /// against `base`
    fn merge(&mut self, layer: ConfigLayer, base: Option<&Path>) {
        if let Some(db) = layer.database {
            self.database = Some(match base {
                Some(base) if db.is_relative() => base.join(db),
                _ => db,
            });
        }
        if let Some(server) = layer.server {
            if let Some(bind) = server.bind {
                self.server.bind = bind;
            }
            if let Some(cors) = server.cors {
                self.server.cors = cors;
            }
            if let Some(url) = server.public_url {
                self.server.public_url = url;
            }
            if let Some(enforce) = server.enforce_roles {
                self.server.enforce_roles = enforce;
            }
        }
        if let Some(log) = layer.log {
            if let Some(level) = log.level {
                self.log.level = level;
            }
            if let Some(json) = log.json {
                self.log.json = json;
            }
        }
        if let Some(chat) = layer.chat {
            if let Some(mode) = chat.mode {
                self.chat.mode = mode;
            }
            if chat.upstream.is_some() {
                self.chat.upstream = chat.upstream;
            }
            if let Some(timeout) = chat.timeout_secs {
                self.chat.timeout_secs = timeout;
            }
        }
        if let Some(portal) = layer.portal {
            if let Some(days) = portal.default_expiry_days {
                self.portal.default_expiry_days = days;
            }
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(db) = env("SECT_DATABASE") {
            self.database = Some(PathBuf::from(db));
        }
        if let Some(bind) = env("SECT_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = env("SECT_PUBLIC_URL") {
            self.server.public_url = url;
        }
        if let Some(level) = env("SECT_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(json) = env("SECT_LOG_JSON") {
            self.log.json = parse_bool("SECT_LOG_JSON", &json)?;
        }
        if let Some(mode) = env("SECT_CHAT_MODE") {
            self.chat.mode = mode.parse().map_err(|message| ConfigError::InvalidValue {
                key: "SECT_CHAT_MODE".to_string(),
                message,
            })?;
        }
        if let Some(upstream) = env("SECT_CHAT_UPSTREAM") {
            self.chat.upstream = Some(upstream);
        }
        if let Some(enforce) = env("SECT_ENFORCE_ROLES") {
            self.server.enforce_roles = parse_bool("SECT_ENFORCE_ROLES", &enforce)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=365).contains(&self.portal.default_expiry_days) {
            return Err(ConfigError::InvalidValue {
                key: "portal.default_expiry_days".to_string(),
                message: "must be between 1 and 365".to_string(),
            });
        }
        if self.chat.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chat.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Database file to open: explicit setting, else the workspace default
    pub fn database_path(&self, workspace: Option<&Workspace>) -> Option<PathBuf> {
        self.database
            .clone()
            .or_else(|| workspace.map(|ws| ws.default_db_path()))
    }
}

fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if contents.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }
    serde_yml::from_str(&contents).map_err(|e| {
        ConfigError::Syntax(Box::new(YamlSyntaxError::from_serde_error(
            &e,
            &contents,
            &path.display().to_string(),
        )))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{}'", other),
        }),
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(Box<YamlSyntaxError>),

    #[error("cannot read config file {path:?}: {message}")]
    #[diagnostic(code(sect::config::io))]
    Io { path: PathBuf, message: String },

    #[error("invalid value for {key}: {message}")]
    #[diagnostic(code(sect::config::value))]
    InvalidValue { key: String, message: String },
}
