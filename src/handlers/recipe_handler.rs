use std::sync::Arc;

use crate::error::AssistantError;
use crate::handlers::prompt::{build_image_prompt, build_prompt, VISION_SYSTEM_PROMPT};
use crate::models::{ActionResult, FoodImage, Mode, RecipeRequest, SessionState};
use crate::services::{InferenceService, SpeechService};

/// Runs one user action end to end: pick the flow, build the prompt, call
/// inference, optionally speak the answer, and hand back the next session state.
///
/// Holds no session data itself; the state goes in and comes out with every call.
pub struct RecipeHandler {
    inference: Arc<dyn InferenceService>,
    speech: Arc<dyn SpeechService>,
}

impl RecipeHandler {
    pub fn new(inference: Arc<dyn InferenceService>, speech: Arc<dyn SpeechService>) -> Self {
        Self { inference, speech }
    }

    pub async fn run(
        &self,
        request: RecipeRequest,
        state: &SessionState,
    ) -> Result<ActionResult, AssistantError> {
        log::info!(
            "📨 INCOMING ACTION - Mode: {:?} | Has Image: {} | Text: {} chars | Chained: {}",
            request.mode,
            request.image.is_some(),
            request.raw_text.len(),
            state.is_chained()
        );

        // Image takes priority over any selected mode
        if let Some(image) = &request.image {
            return self.handle_food_image(image, &request.raw_text, state).await;
        }

        let mode = request.mode.ok_or_else(|| {
            log::warn!("⚠️ Text action without a mode, rejecting");
            AssistantError::InvalidRequest("no mode selected".to_string())
        })?;

        self.handle_text(mode, &request.raw_text, state).await
    }

    async fn handle_food_image(
        &self,
        image: &FoodImage,
        hint: &str,
        state: &SessionState,
    ) -> Result<ActionResult, AssistantError> {
        let prompt = build_image_prompt(hint);

        let generated = self
            .inference
            .complete_vision(VISION_SYSTEM_PROMPT, &prompt, image)
            .await
            .map_err(|e| inference_error("vision", e))?;
        let generated = non_empty(generated)?;

        log::info!("✅ Image analysis done ({} chars)", generated.len());

        Ok(ActionResult {
            display_text: generated,
            audio: None,
            updated_state: state.clone(),
        })
    }

    async fn handle_text(
        &self,
        mode: Mode,
        raw_text: &str,
        state: &SessionState,
    ) -> Result<ActionResult, AssistantError> {
        let source = source_text(mode, raw_text, state);
        let prompt = build_prompt(mode, source);
        let generated = self
            .inference
            .complete_text(&prompt)
            .await
            .map_err(|e| inference_error("text", e))?;
        let generated = non_empty(generated)?;

        let audio = match mode {
            Mode::ConvertToAudio => Some(self.speech.synthesize(&generated).await.map_err(|e| {
                log::error!("❌ Speech synthesis failed: {:#}", e);
                AssistantError::Synthesis(format!("{:#}", e))
            })?),
            Mode::Improve
            | Mode::HealthySubstitute
            | Mode::Simplify
            | Mode::GenerateShoppingList
            | Mode::CalorieBreakdown => None,
        };

        let updated_state = if mode.is_chain_eligible() {
            SessionState {
                last_generated: generated.clone(),
            }
        } else {
            state.clone()
        };

        log::info!(
            "✅ {} done ({} chars, audio: {}, chain updated: {})",
            mode,
            generated.len(),
            audio.is_some(),
            mode.is_chain_eligible()
        );

        Ok(ActionResult {
            display_text: generated,
            audio,
            updated_state,
        })
    }
}

/// Calorie Breakdown works on the last chained result when there is one;
/// every other mode works on what the user typed.
pub fn source_text<'a>(mode: Mode, raw_text: &'a str, state: &'a SessionState) -> &'a str {
    if mode.reads_chain() && state.is_chained() {
        &state.last_generated
    } else {
        raw_text
    }
}

fn inference_error(flow: &str, e: anyhow::Error) -> AssistantError {
    log::error!("❌ {} inference failed: {:#}", flow, e);
    AssistantError::Inference(format!("{:#}", e))
}

fn non_empty(generated: String) -> Result<String, AssistantError> {
    if generated.trim().is_empty() {
        log::error!("❌ Model returned empty content");
        return Err(AssistantError::Inference("model returned no content".to_string()));
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioArtifact;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockInference {
        reply: Option<String>,
        text_prompts: Mutex<Vec<String>>,
        vision_prompts: Mutex<Vec<String>>,
    }

    impl MockInference {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn last_text_prompt(&self) -> String {
            self.text_prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl InferenceService for MockInference {
        async fn complete_vision(&self, system: &str, prompt: &str, _image: &FoodImage) -> anyhow::Result<String> {
            assert_eq!(system, VISION_SYSTEM_PROMPT);
            self.vision_prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Groq API error (503): unavailable"))
        }

        async fn complete_text(&self, prompt: &str) -> anyhow::Result<String> {
            self.text_prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Groq API error (503): unavailable"))
        }
    }

    struct MockSpeech {
        fail: bool,
        spoken: Mutex<Vec<String>>,
    }

    impl MockSpeech {
        fn new() -> Self {
            Self {
                fail: false,
                spoken: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl SpeechService for MockSpeech {
        async fn synthesize(&self, text: &str) -> anyhow::Result<AudioArtifact> {
            if self.fail {
                anyhow::bail!("TTS error (429): too many requests");
            }
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(AudioArtifact {
                path: PathBuf::from("/tmp/recipe_test.mp3"),
            })
        }
    }

    fn handler(inference: Arc<MockInference>, speech: Arc<MockSpeech>) -> RecipeHandler {
        RecipeHandler::new(inference, speech)
    }

    fn chained(text: &str) -> SessionState {
        SessionState {
            last_generated: text.to_string(),
        }
    }

    fn photo() -> FoodImage {
        FoodImage::new(vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn test_chain_eligible_modes_update_state() {
        for mode in [Mode::Improve, Mode::HealthySubstitute, Mode::Simplify, Mode::GenerateShoppingList] {
            let inference = Arc::new(MockInference::replying("Better recipe"));
            let handler = handler(inference.clone(), Arc::new(MockSpeech::new()));

            let result = handler
                .run(RecipeRequest::text("boil egg", Some(mode)), &chained("old"))
                .await
                .unwrap();

            assert_eq!(result.display_text, "Better recipe");
            assert_eq!(result.updated_state.last_generated, "Better recipe");
            assert!(result.audio.is_none());
            assert!(inference.last_text_prompt().contains("boil egg"));
        }
    }

    #[tokio::test]
    async fn test_terminal_modes_leave_state_unchanged() {
        for mode in [Mode::CalorieBreakdown, Mode::ConvertToAudio] {
            let handler = handler(
                Arc::new(MockInference::replying("TOTAL CALORIES: 300 kcal")),
                Arc::new(MockSpeech::new()),
            );
            let state = chained("Soup recipe v2");

            let result = handler
                .run(RecipeRequest::text("soup", Some(mode)), &state)
                .await
                .unwrap();

            assert_eq!(result.updated_state, state);
        }
    }

    #[tokio::test]
    async fn test_calorie_breakdown_reads_chain() {
        let inference = Arc::new(MockInference::replying("TOTAL CALORIES: 250 kcal"));
        let handler = handler(inference.clone(), Arc::new(MockSpeech::new()));

        handler
            .run(
                RecipeRequest::text("something else entirely", Some(Mode::CalorieBreakdown)),
                &chained("Soup recipe v2"),
            )
            .await
            .unwrap();

        let prompt = inference.last_text_prompt();
        assert!(prompt.contains("Soup recipe v2"));
        assert!(!prompt.contains("something else entirely"));
    }

    #[tokio::test]
    async fn test_calorie_breakdown_falls_back_to_raw_text() {
        let inference = Arc::new(MockInference::replying("- Egg\nTOTAL CALORIES: 455 kcal"));
        let handler = handler(inference.clone(), Arc::new(MockSpeech::new()));

        let result = handler
            .run(
                RecipeRequest::text("2 eggs, 1 cup flour", Some(Mode::CalorieBreakdown)),
                &SessionState::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            inference.last_text_prompt(),
            build_prompt(Mode::CalorieBreakdown, "2 eggs, 1 cup flour")
        );
        assert!(result
            .display_text
            .lines()
            .any(|line| line.trim_end().ends_with("kcal") && line.contains("TOTAL CALORIES:")));
        assert!(!result.updated_state.is_chained());
    }

    #[test]
    fn test_only_calorie_breakdown_reads_chain() {
        let state = chained("chained");
        for mode in Mode::ALL {
            let expected = if mode == Mode::CalorieBreakdown { "chained" } else { "raw" };
            assert_eq!(source_text(mode, "raw", &state), expected);
        }
        assert_eq!(source_text(Mode::CalorieBreakdown, "raw", &SessionState::default()), "raw");
    }

    #[tokio::test]
    async fn test_improve_then_calorie_breakdown_chains() {
        let improve = Arc::new(MockInference::replying("Soft-boiled egg with chives"));
        let state = handler(improve, Arc::new(MockSpeech::new()))
            .run(RecipeRequest::text("boil egg", Some(Mode::Improve)), &SessionState::default())
            .await
            .unwrap()
            .updated_state;
        assert_eq!(state.last_generated, "Soft-boiled egg with chives");

        let calories = Arc::new(MockInference::replying("TOTAL CALORIES: 80 kcal"));
        handler(calories.clone(), Arc::new(MockSpeech::new()))
            .run(RecipeRequest::text("", Some(Mode::CalorieBreakdown)), &state)
            .await
            .unwrap();

        assert!(calories.last_text_prompt().ends_with("Soft-boiled egg with chives"));
    }

    #[tokio::test]
    async fn test_convert_to_audio_synthesizes_generated_text() {
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(Arc::new(MockInference::replying("Read me aloud")), speech.clone());

        let result = handler
            .run(RecipeRequest::text("boil egg", Some(Mode::ConvertToAudio)), &SessionState::default())
            .await
            .unwrap();

        let audio = result.audio.unwrap();
        assert_eq!(audio.path, PathBuf::from("/tmp/recipe_test.mp3"));
        assert_eq!(*speech.spoken.lock().unwrap(), vec!["Read me aloud".to_string()]);
    }

    #[tokio::test]
    async fn test_no_audio_outside_convert_to_audio() {
        for mode in Mode::ALL.into_iter().filter(|m| *m != Mode::ConvertToAudio) {
            let speech = Arc::new(MockSpeech::new());
            let handler = handler(Arc::new(MockInference::replying("ok")), speech.clone());

            let result = handler
                .run(RecipeRequest::text("boil egg", Some(mode)), &SessionState::default())
                .await
                .unwrap();

            assert!(result.audio.is_none());
            assert!(speech.spoken.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_image_ignores_mode() {
        let inference = Arc::new(MockInference::replying("Pizza slice\nTOTAL CALORIES: 285 kcal"));
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(inference.clone(), speech.clone());
        let state = chained("Soup recipe v2");

        let request = RecipeRequest {
            raw_text: "thin crust".to_string(),
            image: Some(photo()),
            mode: Some(Mode::ConvertToAudio),
        };
        let result = handler.run(request, &state).await.unwrap();

        assert_eq!(result.display_text, "Pizza slice\nTOTAL CALORIES: 285 kcal");
        assert!(result.audio.is_none());
        assert_eq!(result.updated_state, state);
        assert!(speech.spoken.lock().unwrap().is_empty());
        assert!(inference.text_prompts.lock().unwrap().is_empty());

        let vision_prompt = inference.vision_prompts.lock().unwrap()[0].clone();
        assert!(vision_prompt.contains("thin crust"));
    }

    #[tokio::test]
    async fn test_missing_mode_is_rejected_before_inference() {
        let inference = Arc::new(MockInference::replying("unused"));
        let handler = handler(inference.clone(), Arc::new(MockSpeech::new()));

        let err = handler
            .run(RecipeRequest::text("boil egg", None), &SessionState::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::InvalidRequest(_)));
        assert!(inference.text_prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_still_reaches_inference() {
        let inference = Arc::new(MockInference::replying("Try adding a recipe first."));
        let handler = handler(inference.clone(), Arc::new(MockSpeech::new()));

        let result = handler
            .run(RecipeRequest::text("", Some(Mode::Improve)), &SessionState::default())
            .await
            .unwrap();

        assert_eq!(inference.last_text_prompt(), build_prompt(Mode::Improve, ""));
        assert_eq!(result.updated_state.last_generated, "Try adding a recipe first.");
    }

    #[tokio::test]
    async fn test_inference_failure_keeps_state() {
        let handler = handler(Arc::new(MockInference::failing()), Arc::new(MockSpeech::new()));
        let state = chained("Soup recipe v2");

        let err = handler
            .run(RecipeRequest::text("boil egg", Some(Mode::Improve)), &state)
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Inference(_)));
        assert!(err.to_string().contains("503"));
        assert_eq!(state.last_generated, "Soup recipe v2");
    }

    #[tokio::test]
    async fn test_empty_model_output_is_inference_error() {
        let handler = handler(Arc::new(MockInference::replying("  \n")), Arc::new(MockSpeech::new()));

        let err = handler
            .run(RecipeRequest::text("boil egg", Some(Mode::Improve)), &SessionState::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Inference(_)));
    }

    #[tokio::test]
    async fn test_synthesis_failure_surfaces() {
        let speech = Arc::new(MockSpeech {
            fail: true,
            spoken: Mutex::new(Vec::new()),
        });
        let handler = handler(Arc::new(MockInference::replying("Read me")), speech);

        let err = handler
            .run(RecipeRequest::text("boil egg", Some(Mode::ConvertToAudio)), &SessionState::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Synthesis(_)));
    }
}
