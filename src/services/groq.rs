use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::FoodImage;
use crate::services::ai_service::InferenceService;
use crate::services::imaging;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageBody,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageBody {
    Plain(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Client for Groq's OpenAI-compatible chat completions API.
pub struct GroqService {
    api_key: String,
    base_url: String,
    text_model: String,
    vision_model: String,
    client: reqwest::Client,
}

impl GroqService {
    pub fn new(api_key: String, base_url: String, text_model: String, vision_model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_model,
            vision_model,
            client: reqwest::Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn vision_request(&self, system: &str, prompt: &str, data_url: String) -> ChatRequest {
        ChatRequest {
            model: self.vision_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageBody::Plain(system.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageBody::Parts(vec![
                        ContentPart::Text {
                            content_type: "text".to_string(),
                            text: prompt.to_string(),
                        },
                        ContentPart::ImageUrl {
                            content_type: "image_url".to_string(),
                            image_url: ImageData { url: data_url },
                        },
                    ]),
                },
            ],
        }
    }

    fn text_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.text_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageBody::Plain(prompt.to_string()),
            }],
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String> {
        log::info!("🤖 Sending request to Groq with model: {}", request.model);
        log::debug!("📤 Request payload size: {} bytes", serde_json::to_string(request)?.len());

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Groq response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ Groq API error ({}): {}", status, error_text);
            anyhow::bail!("Groq API error ({}): {}", status, error_text);
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw Groq response size: {} bytes", response_text.len());

        extract_content(&response_text)
    }
}

/// Pull the first choice's text out of a chat completions body.
fn extract_content(body: &str) -> Result<String> {
    let chat_response: ChatResponse = serde_json::from_str(body)?;

    let content = chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        anyhow::bail!("Groq returned no content");
    }

    Ok(content)
}

#[async_trait::async_trait]
impl InferenceService for GroqService {
    async fn complete_vision(&self, system: &str, prompt: &str, image: &FoodImage) -> Result<String> {
        log::debug!("📸 Starting image analysis ({} bytes uploaded)", image.bytes.len());

        let data_url = imaging::to_data_url(image)?;
        log::debug!("🔄 Data URL size: {} bytes", data_url.len());

        let request = self.vision_request(system, prompt, data_url);
        self.send(&request).await
    }

    async fn complete_text(&self, prompt: &str) -> Result<String> {
        let request = self.text_request(prompt);
        self.send(&request).await
    }
}
