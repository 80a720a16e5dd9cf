pub mod ai_service;
pub mod groq; // Groq chat completions (text + vision)
pub mod imaging;
pub mod speech; // Google Translate TTS

pub use ai_service::{InferenceService, SpeechService};
pub use groq::GroqService;
pub use speech::GoogleTtsService;
