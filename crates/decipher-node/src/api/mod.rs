//! HTTP handlers.

pub mod artifacts;
pub mod chat;
pub mod health;
pub mod internal;
pub mod notebooks;
pub mod upload;
