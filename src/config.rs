use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::services::llm::BackendKind;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

/// Model backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Default backend when a request does not name one (default: gemini)
    pub provider: String,
    /// Per-call timeout in seconds (default: 120)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
    pub gemini: GeminiConfig,
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Checked at call time, only when Gemini is the selected backend
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Config {
    /// Load configuration with `.env`, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Environment variables (including those read from `.env`)
    /// 2. Configuration file (explicit path, or conf/config.toml, config.toml)
    /// 3. Default values
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }

        let config_path = path.map(str::to_string).or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LLM_PROVIDER: Default backend (gemini | ollama)
    /// - LLM_TIMEOUT_SECS: Per-call timeout (accepts "90", "90s", "2m")
    /// - GEMINI_API_KEY: Gemini credential
    /// - GEMINI_MODEL: Default Gemini model (default: gemini-1.5-pro)
    /// - GEMINI_API_BASE: Gemini REST endpoint
    /// - OLLAMA_HOST: Ollama endpoint (default: http://localhost:11434)
    /// - OLLAMA_MODEL: Default Ollama model (default: llama3)
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,jvmlens=debug")
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider.trim().to_lowercase();
            tracing::info!("Override llm.provider from env: {}", self.llm.provider);
        }

        if let Some(timeout) = lookup("LLM_TIMEOUT_SECS") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.llm.timeout_secs = val;
                    tracing::info!("Override llm.timeout_secs from env: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid LLM_TIMEOUT_SECS '{}': {} (keep {})",
                    timeout,
                    e,
                    self.llm.timeout_secs
                ),
            }
        }

        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.gemini.api_key = Some(key.trim().to_string());
            tracing::info!("Override llm.gemini.api_key from env");
        }

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.gemini.model = model.trim().to_string();
            tracing::info!("Override llm.gemini.model from env: {}", self.llm.gemini.model);
        }

        if let Some(base) = lookup("GEMINI_API_BASE").filter(|b| !b.trim().is_empty()) {
            self.llm.gemini.api_base = base.trim().to_string();
            tracing::info!("Override llm.gemini.api_base from env: {}", self.llm.gemini.api_base);
        }

        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            self.llm.ollama.host = normalize_host(&host);
            tracing::info!("Override llm.ollama.host from env: {}", self.llm.ollama.host);
        }

        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.ollama.model = model.trim().to_string();
            tracing::info!("Override llm.ollama.model from env: {}", self.llm.ollama.model);
        }

        if let Some(level) = lookup("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if BackendKind::parse(&self.llm.provider).is_none() {
            anyhow::bail!(
                "llm.provider must be one of gemini, ollama (got '{}')",
                self.llm.provider
            );
        }

        if self.llm.timeout_secs == 0 {
            anyhow::bail!("llm.timeout_secs must be > 0");
        }

        if self.llm.ollama.host.trim().is_empty() {
            anyhow::bail!("llm.ollama.host cannot be empty");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: BackendKind::Gemini.as_str().to_string(),
            timeout_secs: 120,
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-pro".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { host: "http://localhost:11434".to_string(), model: "llama3".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,jvmlens=debug".to_string(), file: None }
    }
}

// =========================
// Helpers for parsing values
// =========================

/// OLLAMA_HOST is often given as bare "host:port"
fn normalize_host(input: &str) -> String {
    let host = input.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.trim().parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    let too_large = || "duration too large".to_string();
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => n.checked_mul(60).ok_or_else(too_large),
        "h" | "hr" | "hour" | "hours" => n.checked_mul(60 * 60).ok_or_else(too_large),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Custom serde deserializer to support numeric or human-friendly string values
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '2m'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
