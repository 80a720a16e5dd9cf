use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::groq::{DEFAULT_BASE_URL, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL};

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub tts_lang: String,
    pub audio_dir: PathBuf,
    pub bind_addr: String,
    /// Synthesized audio older than this is deleted by the background sweep.
    pub audio_max_age: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let groq_api_key = lookup("GROQ_API_KEY")
            .filter(|value| !value.trim().is_empty())
            .context("GROQ_API_KEY must be set in .env file")?;

        let max_age_minutes = get("AUDIO_MAX_AGE_MINUTES", "60");
        let max_age_minutes: u64 = max_age_minutes
            .trim()
            .parse()
            .with_context(|| format!("AUDIO_MAX_AGE_MINUTES must be a whole number, got '{}'", max_age_minutes))?;

        Ok(Self {
            groq_api_key,
            groq_base_url: get("GROQ_BASE_URL", DEFAULT_BASE_URL),
            text_model: get("GROQ_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            vision_model: get("GROQ_VISION_MODEL", DEFAULT_VISION_MODEL),
            tts_lang: get("TTS_LANG", "en"),
            audio_dir: PathBuf::from(get("AUDIO_DIR", "./data/audio")),
            bind_addr: get("BIND_ADDR", "0.0.0.0:8080"),
            audio_max_age: Duration::from_secs(max_age_minutes * 60),
        })
    }
}
