use crate::models::Mode;

pub const VISION_SYSTEM_PROMPT: &str = "You are an expert food image OCR and calorie estimator.";

/// Trailer every calorie answer must end with, text or image.
pub const TOTAL_CALORIES_TRAILER: &str = "TOTAL CALORIES: X kcal";

/// Build the instruction sent to the text model for `mode` over `source`.
pub fn build_prompt(mode: Mode, source: &str) -> String {
    match mode {
        Mode::CalorieBreakdown => calorie_breakdown_prompt(source),
        // Convert to Audio goes through the generic template; the answer is then spoken.
        Mode::Improve
        | Mode::HealthySubstitute
        | Mode::Simplify
        | Mode::GenerateShoppingList
        | Mode::ConvertToAudio => generic_prompt(mode, source),
    }
}

fn calorie_breakdown_prompt(source: &str) -> String {
    format!(
        "Provide a calorie breakdown of this recipe/text below. Format strictly as:\n\
         - Ingredient name\n\
         - Calories (kcal)\n\
         - Quantity\n\
         - Macros (Protein/Fat/Carbs)\n\
         \n\
         END with: {trailer}\n\
         \n\
         Only list ingredients that appear in the text. Do not invent ingredients.\n\
         Make it easy to paste into MyFitnessPal / Cronometer / LoseIt / MyNetDiary.\n\
         \n\
         Text:\n\
         {source}",
        trailer = TOTAL_CALORIES_TRAILER,
        source = source
    )
}

fn generic_prompt(mode: Mode, source: &str) -> String {
    format!(
        "Task: {}\n\nRecipe:\n{}\n\nProvide helpful, concise output.",
        mode.label(),
        source
    )
}

/// Instruction for the vision model. `hint` is optional user text that biases extraction.
pub fn build_image_prompt(hint: &str) -> String {
    let hint = hint.trim();
    let hint_block = if hint.is_empty() {
        String::new()
    } else {
        format!("Context from the user: {}\n", hint)
    };

    format!(
        "Extract ALL visible ingredients and estimated quantities from this food image.\n\
         {hint_block}\
         Then estimate calorie breakdown based on what you see:\n\
         - Ingredient name\n\
         - Estimated quantity\n\
         - Calories\n\
         - Macros (Protein/Fat/Carbs)\n\
         \n\
         End with: {trailer}\n\
         \n\
         Do not invent ingredients not present in the image.",
        hint_block = hint_block,
        trailer = TOTAL_CALORIES_TRAILER
    )
}
