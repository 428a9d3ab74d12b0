//! Data models for tripgen
//!
//! - `Record`: one timestamped coordinate pair, enriched with place names
//! - `Visit`: a time interval spent at one place

pub mod record;
pub mod visit;

pub use record::Record;
pub use visit::Visit;
