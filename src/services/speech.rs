use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::models::AudioArtifact;
use crate::services::ai_service::SpeechService;

const AUDIO_PREFIX: &str = "recipe_";
const AUDIO_SUFFIX: &str = ".mp3";
const TTS_URL: &str = "https://translate.google.com/translate_tts";
/// Longest text the endpoint accepts per request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Text-to-speech through the public Google Translate voice endpoint.
/// Every synthesis lands in its own `.mp3` under `audio_dir`.
pub struct GoogleTtsService {
    lang: String,
    audio_dir: PathBuf,
    client: reqwest::Client,
}

impl GoogleTtsService {
    pub fn new(lang: String, audio_dir: PathBuf) -> Self {
        Self {
            lang,
            audio_dir,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, index: usize, total: usize) -> Result<Vec<u8>> {
        let idx = index.to_string();
        let total_str = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", chunk),
                ("idx", idx.as_str()),
                ("total", total_str.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ TTS error ({}) on chunk {}/{}", status, index + 1, total);
            anyhow::bail!("TTS error ({}): {}", status, error_text);
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn write_audio(&self, audio: &[u8]) -> Result<AudioArtifact> {
        std::fs::create_dir_all(&self.audio_dir)
            .with_context(|| format!("Could not create audio directory {}", self.audio_dir.display()))?;

        let mut file = tempfile::Builder::new()
            .prefix(AUDIO_PREFIX)
            .suffix(AUDIO_SUFFIX)
            .tempfile_in(&self.audio_dir)?;
        file.write_all(audio)?;

        let (_, path) = file.keep()?;
        log::info!("💾 Audio saved: {} ({} bytes)", path.display(), audio.len());

        Ok(AudioArtifact { path })
    }
}

#[async_trait::async_trait]
impl SpeechService for GoogleTtsService {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        let chunks = split_for_tts(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("Nothing to speak");
        }

        log::info!("🔊 Synthesizing {} chars in {} chunks (lang: {})", text.len(), chunks.len(), self.lang);

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let part = self.fetch_chunk(chunk, index, chunks.len()).await?;
            audio.extend_from_slice(&part);
        }

        self.write_audio(&audio)
    }
}

/// Delete synthesized files in `audio_dir` older than `max_age`. Returns how many were removed.
/// Only files this service wrote (`recipe_*.mp3`) are touched.
pub fn sweep_stale_audio(audio_dir: &Path, max_age: Duration) -> Result<usize> {
    if !audio_dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(audio_dir)?.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(AUDIO_PREFIX) || !name.ends_with(AUDIO_SUFFIX) {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                log::warn!("⚠️ Cannot read age of {}: {}", name, e);
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or_default();
        if age >= max_age {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("⚠️ Could not delete {}: {}", name, e),
            }
        }
    }

    if removed > 0 {
        log::info!("🧹 Removed {} stale audio files from {}", removed, audio_dir.display());
    }

    Ok(removed)
}

/// Break text into pieces of at most `max_chars` characters, preferring
/// whitespace boundaries. Words longer than the limit are cut.
pub fn split_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
