//! # Muleflow Core
//!
//! Shared foundation for the muleflow money-muling detection pipeline.
//!
//! This crate provides:
//! - The transaction and result data model
//! - Pipeline configuration with validated defaults
//! - The error taxonomy surfaced to embedding services
//! - Cooperative cancellation between pipeline stages
//! - A tracing bootstrap for tests and embedders

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::config::DetectionConfig;
    pub use crate::error::{DetectError, Result};
    pub use crate::model::{
        AccountScore, FraudRing, GraphSnapshot, PatternTag, ResultBundle, RingPatternType,
        RiskLevel, SnapshotLink, SnapshotNode, Summary, Transaction,
    };
}
