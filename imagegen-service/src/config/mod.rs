use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Largest accepted upload, checked per image part before decode (20 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Longest accepted instruction text across all operations.
const DEFAULT_MAX_PROMPT_CHARS: usize = 2000;

#[derive(Debug, Clone)]
pub struct ImagegenConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub limits: LimitsConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Backend API key. Doubles as the accepted bearer token for inbound
    /// requests.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Default image model (e.g., gemini-2.5-flash-image-preview).
    pub image_model: String,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
    pub max_prompt_chars: usize,
    pub min_story_images: u32,
    pub max_story_images: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle sweep interval. None (the default) keeps sessions until an
    /// explicit clear or process exit, matching the original behavior.
    pub idle_timeout_secs: Option<u64>,
}

impl ImagegenConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let idle_timeout_secs = match env::var("SESSION_IDLE_TIMEOUT_SECS") {
            Ok(val) => Some(val.parse().map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "SESSION_IDLE_TIMEOUT_SECS must be an integer number of seconds"
                ))
            })?),
            Err(_) => None,
        };

        Ok(ImagegenConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: get_env("GOOGLE_API_KEY", None, is_prod)?,
            },
            models: ModelConfig {
                image_model: get_env(
                    "IMAGEGEN_DEFAULT_MODEL",
                    Some("gemini-2.5-flash-image-preview"),
                    is_prod,
                )?,
            },
            limits: LimitsConfig {
                max_upload_bytes: parse_env(
                    "IMAGEGEN_MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_UPLOAD_BYTES,
                    is_prod,
                )?,
                max_prompt_chars: parse_env(
                    "IMAGEGEN_MAX_PROMPT_CHARS",
                    DEFAULT_MAX_PROMPT_CHARS,
                    is_prod,
                )?,
                min_story_images: parse_env("IMAGEGEN_MIN_STORY_IMAGES", 2, is_prod)?,
                max_story_images: parse_env("IMAGEGEN_MAX_STORY_IMAGES", 15, is_prod)?,
            },
            sessions: SessionConfig { idle_timeout_secs },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T: std::str::FromStr + ToString>(
    key: &str,
    default: T,
    is_prod: bool,
) -> Result<T, AppError> {
    let raw = get_env(key, Some(&default.to_string()), is_prod)?;
    raw.parse()
        .map_err(|_| AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, raw)))
}
