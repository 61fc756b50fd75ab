//! Implementations of the provider port.
//!
//! - `live/` calls the real APIs
//! - `recording/` wraps a live adapter and writes a cassette
//! - `replaying/` answers from a cassette without touching the network

pub mod live;
pub mod recording;
pub mod replaying;
