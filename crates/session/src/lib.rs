//! Per-session conversation state and the transitions user actions drive.

mod cancel;
mod controller;
mod error;
mod history;
mod registry;

pub use cancel::CancelSignal;
pub use controller::{SessionCommand, SessionController, SessionState, DEFAULT_AI_TIMEOUT};
pub use error::SessionError;
pub use history::visited_history;
pub use registry::{SessionHandle, SessionRegistry};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
