//! # Tasar
//!
//! Tasar (Spanish: "to appraise, to price") is a small inference server for
//! pre-trained medical cost regression models. It loads a `.tsr` model
//! artifact from disk at startup and serves predictions over HTTP.
//!
//! ## Example
//!
//! ```rust
//! use tasar::frame::Row;
//! use tasar::model::{CostPredictor, LinearCostModel};
//!
//! let model = LinearCostModel::demo();
//! let row = Row::new()
//!     .with("age", 19.0)
//!     .with("sex", "female")
//!     .with("bmi", 27.9)
//!     .with("children", 0i64)
//!     .with("smoker", "yes")
//!     .with("region", "southwest");
//!
//! let charges = model.predict_one(&row).unwrap();
//! assert!(charges.is_finite());
//! ```
//!
//! ## Architecture
//!
//! - [`artifact`] — the `.tsr` serialized model format (header, JSON
//!   metadata, coefficient block)
//! - [`frame`] — the one-row tabular structure handed to the model
//! - [`model`] — the [`model::CostPredictor`] trait and its linear
//!   regression implementation
//! - [`api`] — axum router, request/response types, and handlers
//! - [`metrics`] — request counters with a Prometheus exporter

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // usize -> f64 for rate metrics is acceptable
#![allow(clippy::cast_possible_truncation)] // duration micros -> u64 is safe
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::float_cmp)] // exact comparisons are intended in tests

pub mod api;
/// Tasar `.tsr` model artifact format (load, inspect, write)
pub mod artifact;
pub mod error;
pub mod frame;
/// Request metrics and Prometheus exposition
pub mod metrics;
pub mod model;

// Re-exports for convenience
pub use error::{Result, TasarError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
