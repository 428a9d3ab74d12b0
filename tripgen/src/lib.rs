//! tripgen library interface
//!
//! Groups geotagged photo records into per-place visits and generates trip
//! titles for them. Exposes the pipeline stages for integration testing.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::pipeline::{PipelineOutcome, TripPipeline, TripTitles};
