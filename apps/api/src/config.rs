use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing; no product can
/// succeed without a model credential, so this is never a per-product error.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,
    pub concurrency_limit: usize,
    pub llm_self_check: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_url: env_or(
                "OPENAI_API_URL",
                "https://api.openai.com/v1/chat/completions",
            ),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_temperature: env_or("OPENAI_TEMPERATURE", "0.7")
                .parse::<f32>()
                .context("OPENAI_TEMPERATURE must be a number")?,
            openai_max_tokens: env_or("OPENAI_MAX_TOKENS", "400")
                .parse::<u32>()
                .context("OPENAI_MAX_TOKENS must be a positive integer")?,
            concurrency_limit: env_or("CONCURRENCY_LIMIT", "1")
                .parse::<usize>()
                .context("CONCURRENCY_LIMIT must be a positive integer")?,
            llm_self_check: parse_bool(&env_or("LLM_SELF_CHECK", "false")),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
