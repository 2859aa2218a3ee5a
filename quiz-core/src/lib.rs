pub mod session_state;
pub mod scoring;
pub mod powerups;
pub mod analytics;
pub mod question_bank;
pub mod quiz_events;

// Re-export main components
pub use session_state::*;
pub use scoring::*;
pub use powerups::*;
pub use analytics::*;
pub use question_bank::*;
pub use quiz_events::*;
