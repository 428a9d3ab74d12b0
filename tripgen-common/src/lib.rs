//! # tripgen Common Library
//!
//! Shared code for the tripgen workspace including:
//! - Common error type
//! - TOML configuration file loading
//! - Timestamp parsing helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
