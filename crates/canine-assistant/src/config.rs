use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use canine_common::openai::OpenAiClientConfig;
use source_router::RouterConfig;

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub listen_addr: SocketAddr,
    /// Only origin allowed by CORS, and required prefix of `/chat` referers.
    pub allowed_origin: String,
    /// `/chat` referers must contain this path.
    pub allowed_path: String,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// Key rate limits on the first `X-Forwarded-For` hop instead of the peer.
    pub trust_forwarded_for: bool,
    pub model: String,
    pub temperature: Option<f32>,
    pub openai: OpenAiClientConfig,
    pub router: RouterConfig,
}

impl AssistantConfig {
    /// Required:
    /// - `OPENAI_API_KEY`
    ///
    /// Optional:
    /// - `PORT` (default: 3000)
    /// - `ALLOWED_ORIGIN`, `ALLOWED_PATH` (default: "/all-breed/")
    /// - `RATE_LIMIT_MAX` (default: 30), `RATE_LIMIT_WINDOW_SECS` (default: 60)
    /// - `TRUST_FORWARDED_FOR` (default: false)
    /// - `OPENAI_MODEL` (default: "gpt-4o-mini"), `OPENAI_TEMPERATURE`
    /// - everything read by `OpenAiClientConfig::from_env` and `RouterConfig::from_env`
    pub fn from_env() -> Result<Self, AppError> {
        let openai = OpenAiClientConfig::from_env();
        if openai.api_key.is_none() {
            return Err(AppError::Config(
                "OPENAI_API_KEY environment variable is required".to_string(),
            ));
        }

        let port = parse_env("PORT", 3000u16)?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "https://standardpoodlesofforestlakes.com".to_string())
            .trim_end_matches('/')
            .to_string();
        let allowed_path =
            std::env::var("ALLOWED_PATH").unwrap_or_else(|_| "/all-breed/".to_string());

        let rate_limit_max = parse_env("RATE_LIMIT_MAX", 30u32)?;
        if rate_limit_max == 0 {
            return Err(AppError::Config("RATE_LIMIT_MAX must be at least 1".to_string()));
        }
        let window_secs = parse_env("RATE_LIMIT_WINDOW_SECS", 60u64)?;
        if window_secs == 0 {
            return Err(AppError::Config(
                "RATE_LIMIT_WINDOW_SECS must be at least 1".to_string(),
            ));
        }

        let trust_forwarded_for = std::env::var("TRUST_FORWARDED_FOR")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let temperature = match std::env::var("OPENAI_TEMPERATURE") {
            Ok(raw) => Some(raw.trim().parse::<f32>().map_err(|_| {
                AppError::Config(format!("OPENAI_TEMPERATURE must be a number, got '{raw}'"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            allowed_origin,
            allowed_path,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(window_secs),
            trust_forwarded_for,
            model,
            temperature,
            openai,
            router: RouterConfig::from_env()?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{name} has an invalid value: '{raw}'"))),
        Err(_) => Ok(default),
    }
}
