pub mod question;
pub mod session;
pub mod analytics;
pub mod messages;
pub mod errors;

// Re-export all types
pub use question::*;
pub use session::*;
pub use analytics::*;
pub use messages::*;
pub use errors::*;
