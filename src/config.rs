//! Configuration types.
//!
//! Only [`AppConfig::from_env`] touches the process environment. Everything
//! it produces is passed down explicitly.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default model per backend.
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Request defaults for every gateway call.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upper bound on a single LLM call.
    pub timeout: Duration,
    /// Sampling temperature (0 keeps answers close to deterministic).
    pub temperature: f32,
    /// Max tokens for the model's answer.
    pub max_tokens: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }
}

/// Pipeline behaviour knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How many trailing conversation entries the training stage sees.
    pub context_window: usize,
    /// Training list used when the model's answer cannot be parsed.
    pub default_training: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_window: 4,
            default_training: [
                "Company Orientation",
                "Department Training",
                "Role-specific Training",
                "System Access Training",
                "Equipment Training",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Everything the binary needs to wire the pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub gateway: GatewayConfig,
    pub pipeline: PipelineConfig,
    /// Root directory for persisted workflow results.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("ONBOARD_LLM_BACKEND") {
            Some(raw) => raw
                .parse::<LlmBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "ONBOARD_LLM_BACKEND".to_string(),
                    message,
                })?,
            None => LlmBackend::Anthropic,
        };

        let (key_var, default_model) = match backend {
            LlmBackend::Anthropic => ("ANTHROPIC_API_KEY", DEFAULT_ANTHROPIC_MODEL),
            LlmBackend::OpenAi => ("OPENAI_API_KEY", DEFAULT_OPENAI_MODEL),
        };
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = lookup("ONBOARD_MODEL").unwrap_or_else(|| default_model.to_string());

        let mut gateway = GatewayConfig::default();
        if let Some(raw) = lookup("ONBOARD_LLM_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "ONBOARD_LLM_TIMEOUT_SECS".to_string(),
                message: format!("'{raw}' is not a whole number of seconds"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "ONBOARD_LLM_TIMEOUT_SECS".to_string(),
                    message: "timeout must be at least 1 second".to_string(),
                });
            }
            gateway.timeout = Duration::from_secs(secs);
        }

        let data_dir = lookup("ONBOARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: secrecy::SecretString::from(api_key),
                model,
            },
            gateway,
            pipeline: PipelineConfig::default(),
            data_dir,
        })
    }
}
