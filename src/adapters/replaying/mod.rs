//! Replaying adapter: answers provider calls from a cassette.

pub mod provider;
