pub mod dispatcher;
pub mod poll_index;
pub mod session_store;

// Re-export actor types for easier import
pub use dispatcher::IntentDispatcherActor;
pub use poll_index::PollIndex;
pub use session_store::{SessionOptions, SessionStoreActor};
