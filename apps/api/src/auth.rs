mod session;

pub use session::{establish_session_handler, logout_handler, me_handler};

pub const SESSION_ACTOR_KEY: &str = "actor";
/// Absolute session creation timestamp.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
