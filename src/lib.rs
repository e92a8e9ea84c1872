// Library surface: the typing-session engine plus the local stores and event
// runtime the terminal front end is built on.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod text;

pub use controller::{FinishEvent, ProgressEvent, SessionController, SnapshotUpdate};
pub use error::{Result, TypeRushError};
pub use session::{SessionState, Snapshot};
