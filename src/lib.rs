//! Multi-provider generation core for node-graph storyboarding.
//!
//! A single [`ProviderAdapter`] contract covers Gemini's native multimodal API,
//! `OpenAI` and OpenAI-compatible gateways. [`ProviderRouter`] picks the adapter
//! per call from [`AppSettings`]; the [`service`] functions are the facade the
//! rest of an application calls.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod image_ref;
pub mod logging;
pub mod model;
pub mod output;
pub mod params;
pub mod ports;
pub mod prompt;
pub mod router;
pub mod service;
pub mod settings;

pub use error::{ErrorKind, GenerationError, GenerationResult};
pub use model::Provider;
pub use params::AspectRatio;
pub use ports::{GenerationConfig, ProviderAdapter};
pub use router::ProviderRouter;
pub use settings::AppSettings;
