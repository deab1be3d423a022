//! # Muleflow Detect
//!
//! Scoring, ring assembly, and orchestration on top of the extracted
//! transaction-graph features.
//!
//! ## Modules
//!
//! - `scoring` - additive/subtractive suspicion scoring with
//!   false-positive suppression
//! - `explain` - deterministic human-readable explanations
//! - `rings` - fraud-ring assembly from cycles and communities
//! - `pipeline` - the end-to-end orchestrator producing the result bundle

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod explain;
pub mod pipeline;
pub mod rings;
pub mod scoring;

pub use pipeline::{run_pipeline, DetectionPipeline};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::pipeline::{run_pipeline, DetectionPipeline};
    pub use muleflow_core::prelude::*;
}
