//! Shared types for Vibe Ripper: errors, configuration, media and profile
//! models, and structured trace events.

pub mod config;
pub mod error;
pub mod media;
pub mod profile;
pub mod trace;
