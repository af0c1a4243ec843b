//! Daemon configuration
//!
//! Layers, lowest to highest precedence:
//! 1. built-in defaults
//! 2. TOML file (if present)
//! 3. `DICED_*` environment variables, `__` separating sections
//!    (e.g. `DICED_NARRATOR__MODEL=sonar-pro`)
//! 4. `PERPLEXITY_API_KEY` for the narrator key

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub narrator: NarratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            bot: BotConfig::default(),
            narrator: NarratorConfig::default(),
        }
    }
}

/// Bot identity and command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Author id the bot posts as; messages from it are ignored
    pub user_id: String,
    /// Prefix for commands such as `!fortune`
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_id: "diced".to_string(),
            command_prefix: "!".to_string(),
        }
    }
}

/// Completion service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    /// API base URL; `/chat/completions` is appended
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Hard limit on a single narration call
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub fortune_max_tokens: u32,
    pub fortune_temperature: f32,
    /// JSON persona data (`{"persona": ..., "samples": [...]}`)
    pub persona_path: Option<PathBuf>,
    /// Requests per user before throttling
    pub rate_limit_capacity: u32,
    pub rate_limit_refill_per_sec: f32,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            api_key: None,
            model: "sonar".to_string(),
            timeout_secs: 10,
            max_tokens: 300,
            temperature: 0.7,
            fortune_max_tokens: 400,
            fortune_temperature: 0.8,
            persona_path: None,
            rate_limit_capacity: 60,
            rate_limit_refill_per_sec: 1.0,
        }
    }
}

impl Config {
    /// Base figment for a config file path, without extraction
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed("DICED_").split("__"))
            .merge(Env::raw().only(&["PERPLEXITY_API_KEY"]).map(|_| "narrator.api_key".into()))
    }

    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}
