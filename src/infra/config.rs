use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Process-level settings for the tool server.
pub struct Config {
    pub mode: String, // "stdio" or "server"
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let mode = std::env::var("MODE").unwrap_or_else(|_| "stdio".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        Self { mode, port }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            return Err(ConfigError::Invalid(format!(
                "Invalid MODE: {}. Must be 'server' or 'stdio'",
                self.mode
            )));
        }
        if self.mode == "server" && self.port == 0 {
            return Err(ConfigError::Invalid("PORT cannot be 0".into()));
        }
        Ok(())
    }
}

/// Connection settings for the game's text API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub host: String,
    pub port: u16,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4711,
            retries: 2,
            retry_delay_ms: 2_000,
            connect_timeout_ms: 2_000,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture command; `{path}` is replaced with the output file.
    pub command: Vec<String>,
    pub output_dir: PathBuf,
    pub timeout_ms: u64,
}

pub const GAME_WINDOW_TITLE: &str = "Minecraft: Pi Edition: Reborn (Client)";

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "import".into(),
                "-window".into(),
                GAME_WINDOW_TITLE.into(),
                "{path}".into(),
            ],
            output_dir: PathBuf::from("images"),
            timeout_ms: 10_000,
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a professional at creating structures in Minecraft. Please use the given tools to meet user requests.
However, user requests may be rough and lack information. In such cases, proceed by assuming what the user wants as a professional.
Before starting work, during work, and at the end, please use the capture tool and image_reader, setPlayerPos tools to understand the situation in the Minecraft field.
Since the player's perspective is fixed in a bird's-eye view, it is important to check if everything looks appropriate from above.
Frequent checks improve the accuracy of your work, so they need to be done often.";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_turns: usize,
    pub retries: u32,
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            model: "claude-3-7-sonnet-20250219".into(),
            max_tokens: 1000,
            temperature: 0.0,
            max_turns: 100,
            retries: 2,
            connect_timeout_ms: 5_000,
            timeout_ms: 120_000,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
}

/// Application settings: optional TOML file overlaid with environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub capture: CaptureConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

pub const DEFAULT_CONFIG_FILE: &str = "minecraft-mcp.toml";

impl AppConfig {
    /// Load `CONFIG_PATH` (or `minecraft-mcp.toml` when present) and apply env overrides.
    pub fn from_env_and_toml() -> Result<Self, ConfigError> {
        let explicit = std::env::var("CONFIG_PATH").ok().filter(|p| !p.trim().is_empty());
        let mut cfg = match explicit {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) {
        if let Some(host) = env_non_empty("MINECRAFT_HOST") {
            self.world.host = host;
        }
        if let Some(port) = env_non_empty("MINECRAFT_PORT").and_then(|p| p.parse().ok()) {
            self.world.port = port;
        }
        if let Some(model) = env_non_empty("MODEL_ID") {
            self.model.model = model;
        }
        if let Some(base) = env_non_empty("ANTHROPIC_BASE_URL") {
            self.model.base_url = base;
        }
        if let Some(dir) = env_non_empty("LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = env_non_empty("CAPTURE_DIR") {
            self.capture.output_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.host.trim().is_empty() {
            return Err(ConfigError::Invalid("world.host cannot be empty".into()));
        }
        if self.world.port == 0 {
            return Err(ConfigError::Invalid("world.port cannot be 0".into()));
        }
        if self.capture.command.is_empty() {
            return Err(ConfigError::Invalid("capture.command cannot be empty".into()));
        }
        if self.model.max_turns == 0 {
            return Err(ConfigError::Invalid("model.max_turns must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid("model.temperature must be between 0 and 1".into()));
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// One entry of the client's `mcpServers` registry file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct McpServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
}

/// `{"mcpServers": {"<name>": {...}}}`; servers are sorted by name.
#[derive(Debug, Clone, Deserialize)]
pub struct McpServersConfig {
    #[serde(rename = "mcpServers")]
    pub servers: BTreeMap<String, McpServerEntry>,
}

impl McpServersConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!(path = %path.display(), "loading tool registry config");
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if value.get("mcpServers").is_none() {
            return Err(ConfigError::Invalid(
                "invalid configuration file: 'mcpServers' key is missing".into(),
            ));
        }
        let cfg: Self = serde_json::from_value(value).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if cfg.servers.is_empty() {
            return Err(ConfigError::Invalid(
                "no server configurations found in the config file".into(),
            ));
        }
        if let Some((name, _)) = cfg.servers.iter().find(|(_, e)| e.command.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("server '{name}' has no command")));
        }
        tracing::debug!(servers = cfg.servers.len(), "tool registry config loaded");
        Ok(cfg)
    }
}
