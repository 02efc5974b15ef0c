use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_PLAN_MODEL: &str = "gpt-4o";
pub const DEFAULT_RESPONSE_LANGUAGE: &str = "Brazilian Portuguese";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which provider model serves each kind of request.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub chat: String,
    pub vision: String,
    pub plan: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            chat: DEFAULT_CHAT_MODEL.to_string(),
            vision: DEFAULT_VISION_MODEL.to_string(),
            plan: DEFAULT_PLAN_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Provider credential. `None` keeps the server up but every provider call fails fast.
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: ModelSelection,
    /// Language the model should use for free-text values (food names, meal descriptions).
    pub response_language: String,
    pub request_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: ModelSelection::default(),
            response_language: DEFAULT_RESPONSE_LANGUAGE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = non_empty("OPENAI_API_KEY");
        if api_key.is_none() {
            log::warn!("⚠️ OPENAI_API_KEY not set, every AI request will be rejected");
        }

        let request_timeout = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!("⚠️ Invalid REQUEST_TIMEOUT_SECS '{}', using {}s", raw, DEFAULT_TIMEOUT_SECS);
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        let port = match non_empty("APP_PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                log::warn!("⚠️ Invalid APP_PORT '{}', using {}", raw, defaults.port);
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            api_key,
            base_url: non_empty("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            models: ModelSelection {
                chat: non_empty("CHAT_MODEL").unwrap_or(defaults.models.chat),
                vision: non_empty("VISION_MODEL").unwrap_or(defaults.models.vision),
                plan: non_empty("PLAN_MODEL").unwrap_or(defaults.models.plan),
            },
            response_language: non_empty("RESPONSE_LANGUAGE").unwrap_or(defaults.response_language),
            request_timeout,
            host: non_empty("APP_HOST").unwrap_or(defaults.host),
            port,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
