use anyhow::Result;

use crate::models::{AudioArtifact, FoodImage};

/// Trait for chat-completion backends (Groq, OpenRouter, anything OpenAI compatible)
#[async_trait::async_trait]
pub trait InferenceService: Send + Sync {
    /// Vision model call: system instruction, prompt and one photo.
    async fn complete_vision(&self, system: &str, prompt: &str, image: &FoodImage) -> Result<String>;
    /// Text model call with the prompt alone.
    async fn complete_text(&self, prompt: &str) -> Result<String>;
}

/// Trait for text-to-speech backends
#[async_trait::async_trait]
pub trait SpeechService: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact>;
}
