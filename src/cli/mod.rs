//! CLI command implementations

mod auth;
mod entries;
mod progress;
pub mod style;

pub use auth::{AuthAction, run_auth};
pub use entries::{EntryCommand, run_entry_command};
pub use progress::CliProgress;
