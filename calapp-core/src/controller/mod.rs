//! Controllers: call a gateway, wait for it to settle, then dispatch exactly
//! one transition to the store.

pub mod calendar;
pub mod session;

pub use calendar::{EventController, SaveOutcome};
pub use session::{
    LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE, SessionController, register_failure_message,
};
