//! Record/replay of provider calls as YAML cassettes.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
