//! Core business logic for moodlog.
//!
//! Emotion classification, mood blending, day keys and annotation geometry
//! live here; HTTP and storage concerns stay in their own crates.

pub mod services;

pub use services::*;
