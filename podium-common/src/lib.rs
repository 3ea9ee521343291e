//! # Podium Common Library
//!
//! Shared code for the Podium results-import tooling:
//! - Error and result types
//! - TOML bootstrap configuration and root folder resolution
//! - Race time formatting

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
