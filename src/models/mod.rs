//! Data models for the desktop client

pub mod config;
pub mod update;

pub use config::*;
pub use update::*;
