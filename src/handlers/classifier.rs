use crate::models::{Mode, SelectorState};

/// Decide how the mode selector behaves after the image input changes.
/// An attached photo pins the selector to Calorie Breakdown; removing it
/// hands the selector back to the user with nothing selected.
pub fn classify(has_image: bool, current: Option<Mode>) -> SelectorState {
    if has_image {
        if current != Some(Mode::CalorieBreakdown) {
            log::debug!("📸 Image attached, forcing mode {} (was {:?})", Mode::CalorieBreakdown, current);
        }
        SelectorState {
            mode: Some(Mode::CalorieBreakdown),
            interactive: false,
            context_visible: true,
        }
    } else {
        SelectorState {
            mode: None,
            interactive: true,
            context_visible: false,
        }
    }
}
