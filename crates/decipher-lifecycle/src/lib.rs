//! # Decipher Lifecycle
//!
//! Drives notebooks through their lifecycle: creation as a compensating
//! saga, retry, source replacement, and the trigger side of derived
//! artifact generation.

pub mod controller;
pub mod saga;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use controller::{GenerationStart, LifecycleController};
pub use saga::{CreationSaga, Reservation, SagaOutcome};
pub use trigger::{artifact_path, GenerationConfig, GenerationService, HttpGenerationService};
