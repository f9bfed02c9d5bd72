//! Pipeline module - ingestion, aggregation, scoring and segmentation

pub mod aggregate;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod projection;
pub mod scoring;
pub mod segment;
pub mod segmentation;

pub use aggregate::*;
pub use error::*;
pub use ingest::*;
pub use loader::*;
pub use projection::*;
pub use scoring::*;
pub use segment::*;
pub use segmentation::*;
