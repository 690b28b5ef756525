//! # Decipher Store
//!
//! Durable record of notebooks, their sources, processing status and outputs.

pub mod store;

pub use store::{ArtifactClaim, ArtifactStore, InMemoryArtifactStore, NewNotebook};
