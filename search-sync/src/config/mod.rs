//! Process configuration and dependency wiring.

mod dependencies;
mod settings;

pub use dependencies::{Collaborators, Dependencies};
pub use settings::{LogFormat, SyncSettings};
