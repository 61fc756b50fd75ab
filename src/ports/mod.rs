//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/` and `src/router.rs`.

pub mod provider;

pub use provider::{ArtifactFuture, GenerationConfig, ProviderAdapter, TextFuture};
