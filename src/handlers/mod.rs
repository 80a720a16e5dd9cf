pub mod classifier;
pub mod prompt;
pub mod recipe_handler;

pub use recipe_handler::RecipeHandler;
