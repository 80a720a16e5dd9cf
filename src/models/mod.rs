use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transformation the user asks for. "No selection" is `Option::<Mode>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "Improve", alias = "improve")]
    Improve,
    #[serde(rename = "Healthy Substitute", alias = "healthy_substitute")]
    HealthySubstitute,
    #[serde(rename = "Simplify", alias = "simplify")]
    Simplify,
    #[serde(rename = "Generate Shopping List", alias = "generate_shopping_list")]
    GenerateShoppingList,
    #[serde(rename = "Calorie Breakdown", alias = "calorie_breakdown")]
    CalorieBreakdown,
    #[serde(rename = "Convert to Audio", alias = "convert_to_audio")]
    ConvertToAudio,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Improve,
        Mode::HealthySubstitute,
        Mode::Simplify,
        Mode::GenerateShoppingList,
        Mode::CalorieBreakdown,
        Mode::ConvertToAudio,
    ];

    /// Label shown in the mode selector and used inside generic prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Improve => "Improve",
            Mode::HealthySubstitute => "Healthy Substitute",
            Mode::Simplify => "Simplify",
            Mode::GenerateShoppingList => "Generate Shopping List",
            Mode::CalorieBreakdown => "Calorie Breakdown",
            Mode::ConvertToAudio => "Convert to Audio",
        }
    }

    /// Modes whose output replaces `SessionState::last_generated`.
    pub fn is_chain_eligible(&self) -> bool {
        match self {
            Mode::Improve | Mode::HealthySubstitute | Mode::Simplify | Mode::GenerateShoppingList => true,
            Mode::CalorieBreakdown | Mode::ConvertToAudio => false,
        }
    }

    /// Modes that read `SessionState::last_generated` as their source.
    pub fn reads_chain(&self) -> bool {
        matches!(self, Mode::CalorieBreakdown)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cross-call memory of one session. Callers carry it between actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub last_generated: String,
}

impl SessionState {
    pub fn is_chained(&self) -> bool {
        !self.last_generated.is_empty()
    }
}

/// Encoded photo as uploaded (any format the `image` crate can decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodImage {
    pub bytes: Vec<u8>,
}

impl FoodImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeRequest {
    pub raw_text: String,
    pub image: Option<FoodImage>,
    pub mode: Option<Mode>,
}

#[cfg(test)]
impl RecipeRequest {
    pub fn text(raw_text: impl Into<String>, mode: Option<Mode>) -> Self {
        Self {
            raw_text: raw_text.into(),
            image: None,
            mode,
        }
    }
}

/// Synthesized speech written to disk. The caller owns the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub path: PathBuf,
}

impl AudioArtifact {
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct ActionResult {
    pub display_text: String,
    pub audio: Option<AudioArtifact>,
    pub updated_state: SessionState,
}

/// What the mode selector should look like after an image change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorState {
    pub mode: Option<Mode>,
    pub interactive: bool,
    pub context_visible: bool,
}
