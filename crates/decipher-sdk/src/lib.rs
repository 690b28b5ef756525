//! # Decipher SDK
//!
//! Client SDK for Decipher nodes, plus the status pollers a notebook view
//! runs while it is on screen.

pub mod client;
pub mod monitor;
pub mod poller;

#[cfg(test)]
mod testing;

pub use client::{DecipherClient, GenerationAccepted, NotebookApi};
pub use monitor::{GenerateOutcome, NotebookMonitor};
pub use poller::{ArtifactPoller, Notification, PollConfig, PollExit, PollHandle, StatusPoller};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::{DecipherClient, NotebookApi};
    pub use crate::monitor::NotebookMonitor;
    pub use crate::poller::{Notification, PollConfig};
    pub use decipher_core::prelude::*;
}
