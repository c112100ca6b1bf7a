pub mod game_state;
pub mod rules;
pub mod scoring;
pub mod time_limit;
pub mod word_validation;

// Re-export main components
pub use game_state::*;
pub use rules::{Rule, DEFAULT_MIN_WORD_LENGTH, random_letter};
pub use scoring::*;
pub use time_limit::*;
pub use word_validation::*;
