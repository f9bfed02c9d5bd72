//! Report module - terminal summary and output files

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
