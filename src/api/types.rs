//! API request/response types
//!
//! Request bodies deserialize through axum's `Json` extractor, so a body
//! missing a field or carrying a mistyped value is rejected with 422
//! before any handler runs.

use serde::{Deserialize, Serialize};

use crate::frame::Row;

/// One patient's attributes for cost prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,
    /// Reported sex (vocabulary defined by the model artifact)
    pub sex: String,
    /// Body mass index
    pub bmi: f64,
    /// Number of dependent children
    pub children: i64,
    /// Smoker flag (vocabulary defined by the model artifact)
    pub smoker: String,
    /// Residential region (vocabulary defined by the model artifact)
    pub region: String,
}

impl PatientRecord {
    /// Build the one-row tabular structure handed to the model. Column
    /// names must match the artifact's training schema exactly.
    #[must_use]
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("age", self.age)
            .with("sex", self.sex.as_str())
            .with("bmi", self.bmi)
            .with("children", self.children)
            .with("smoker", self.smoker.as_str())
            .with("region", self.region.as_str())
    }
}

/// Prediction response: a single numeric field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted medical charges
    pub predicted_charges: f64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Name of the loaded model
    pub model: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
