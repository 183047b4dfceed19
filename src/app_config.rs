use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::DispatchError;

/// Application configuration module
/// This module handles the configuration file (conf.json), the per-run
/// configuration record and the parameters handed to workers.
/// Represents the application configuration file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory receiving demo results
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// Host the web server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the web server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// External engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Free-form parameters forwarded to every worker
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// External translation engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    // @field: Engine executable
    #[serde(default = "default_engine_command")]
    pub command: String,

    // @field: Arguments placed before the engine sub-command
    #[serde(default = "default_engine_args")]
    pub args: Vec<String>,

    // @field: Per-image timeout, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: default_engine_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Execution mode of a run
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    // @mode: Single image, fixed overwrite destination
    Demo,
    // @mode: Sequential run over a list of paths
    Batch,
    // @mode: HTTP server
    Web,
    // @mode: Client of a remote server
    WebClient,
    // @mode: Websocket worker
    Ws,
    // @mode: HTTP API worker
    Api,
    // @mode: Shared-queue worker
    Shared,
}

impl RunMode {
    /// All modes, in CLI order
    pub const ALL: [RunMode; 7] = [
        Self::Demo,
        Self::Batch,
        Self::Web,
        Self::WebClient,
        Self::Ws,
        Self::Api,
        Self::Shared,
    ];

    // @returns: Mode identifier as used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Batch => "batch",
            Self::Web => "web",
            Self::WebClient => "web_client",
            Self::Ws => "ws",
            Self::Api => "api",
            Self::Shared => "shared",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = DispatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownMode(s.to_string()))
    }
}

/// Parameters handed opaquely to workers
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WorkerParams {
    /// Replace existing output files
    #[serde(default)]
    pub overwrite: bool,

    /// Mode-specific settings
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkerParams {
    /// Copy of these parameters with overwrite forced on
    pub fn overwriting(&self) -> Self {
        Self {
            overwrite: true,
            ..self.clone()
        }
    }

    /// Serialize for the engine command line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a `key=value` pair; the value is read as JSON when it parses, else as a string
    pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got: {}", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Empty parameter name in: {}", pair));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((key.to_string(), value))
    }
}

/// Immutable configuration of a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    pub inputs: Vec<PathBuf>,
    pub dest: PathBuf,
    pub pre_dict: Option<PathBuf>,
    pub post_dict: Option<PathBuf>,
    pub verbose: bool,
    pub host: String,
    pub port: u16,
    pub result_dir: PathBuf,
    pub params: WorkerParams,
}

impl RunConfig {
    /// Run configuration for `mode` taking every default from the config file
    pub fn from_config(mode: RunMode, config: &Config) -> Self {
        Self {
            mode,
            inputs: Vec::new(),
            dest: config.result_dir.clone(),
            pre_dict: None,
            post_dict: None,
            verbose: false,
            host: config.host.clone(),
            port: config.port,
            result_dir: config.result_dir.clone(),
            params: WorkerParams {
                overwrite: false,
                extra: config.params.clone(),
            },
        }
    }

    /// Destination of the demo result, always overwritten
    pub fn demo_dest(&self) -> PathBuf {
        self.result_dir.join("final.png")
    }

    /// Check the values that command-line overrides may have changed
    pub fn validate(&self) -> std::result::Result<(), DispatchError> {
        if self.port == 0 {
            return Err(DispatchError::InvalidValue {
                key: "port".to_string(),
                message: "must be between 1 and 65535".to_string(),
            });
        }
        if self.host.trim().is_empty() {
            return Err(DispatchError::InvalidValue {
                key: "host".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Config {
    /// Load the configuration from `path`, writing a default file when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> std::result::Result<(), DispatchError> {
        if self.engine.command.trim().is_empty() {
            return Err(DispatchError::InvalidValue {
                key: "engine.command".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            result_dir: default_result_dir(),
            host: default_host(),
            port: default_port(),
            engine: EngineConfig::default(),
            params: Map::new(),
        }
    }
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("result")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5003
}

fn default_engine_command() -> String {
    "python".to_string()
}

fn default_engine_args() -> Vec<String> {
    vec!["-m".to_string(), "manga_translator.engine".to_string()]
}

fn default_timeout_secs() -> u64 {
    600
}
