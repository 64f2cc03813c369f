//! Cost predictor trait and the linear regression implementation
//!
//! The HTTP layer talks to the model through [`CostPredictor`], a narrow
//! batch-predict interface. The trait boundary keeps the artifact's
//! encoding details out of the handlers and lets tests substitute a stub
//! predictor without touching the API surface.

use crate::artifact::{Artifact, ArtifactMetadata, ColumnSpec};
use crate::error::{Result, TasarError};
use crate::frame::Row;

/// Model type tag expected in artifact metadata
pub const LINEAR_REGRESSION: &str = "linear_regression";

/// The opaque prediction capability the server is built around.
///
/// Implementations must be safe for concurrent invocation; the server
/// shares one predictor across all request handlers behind an `Arc`.
pub trait CostPredictor: Send + Sync {
    /// Predict one value per input row
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>>;

    /// Predict for a single row: a one-row batch, first element out
    fn predict_one(&self, row: &Row) -> Result<f64> {
        let predictions = self.predict(std::slice::from_ref(row))?;
        predictions
            .into_iter()
            .next()
            .ok_or_else(|| TasarError::InferenceError {
                reason: "Predictor returned an empty batch for one row".to_string(),
            })
    }
}

/// Linear regression over a mixed numeric/categorical schema.
///
/// Categorical columns are one-hot encoded against the vocabulary stored
/// in the artifact, one coefficient per vocabulary entry. Rows supply raw
/// column values; the encoding never leaves this type.
#[derive(Debug, Clone)]
pub struct LinearCostModel {
    columns: Vec<ColumnSpec>,
    intercept: f32,
    coefficients: Vec<f32>,
}

impl LinearCostModel {
    /// Build a model from a parsed artifact.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if the artifact is not a linear regression or
    /// its coefficient count disagrees with the schema width.
    pub fn from_artifact(artifact: &Artifact) -> Result<Self> {
        let metadata = artifact.metadata();
        if metadata.model_type != LINEAR_REGRESSION {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Unsupported model type {:?} (expected {:?})",
                    metadata.model_type, LINEAR_REGRESSION
                ),
            });
        }
        if metadata.columns.is_empty() {
            return Err(TasarError::FormatError {
                reason: "Artifact metadata declares no input columns".to_string(),
            });
        }
        if artifact.coefficients().len() != metadata.encoded_width() {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Coefficient count {} does not match schema width {}",
                    artifact.coefficients().len(),
                    metadata.encoded_width()
                ),
            });
        }

        Ok(Self {
            columns: metadata.columns.clone(),
            intercept: artifact.intercept(),
            coefficients: artifact.coefficients().to_vec(),
        })
    }

    /// A ready-to-serve model over the six-column medical cost schema
    /// with fixed coefficients. Used by `serve --demo` and tests; no
    /// artifact file needed.
    #[must_use]
    pub fn demo() -> Self {
        let columns = demo_columns();
        Self {
            coefficients: demo_coefficients(&columns),
            columns,
            intercept: -11000.0,
        }
    }

    /// Input schema in training column order
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Encode one row into the model's feature vector.
    ///
    /// Numeric columns accept float or integer cells; categorical columns
    /// require a string cell present in the artifact's vocabulary.
    fn encode(&self, row: &Row) -> Result<Vec<f32>> {
        let mut features = Vec::with_capacity(self.coefficients.len());

        for column in &self.columns {
            let cell = row.get(column.name()).ok_or_else(|| TasarError::SchemaError {
                reason: format!("Missing column {:?}", column.name()),
            })?;

            match column {
                ColumnSpec::Numeric { name } => {
                    let value = cell.as_f64().ok_or_else(|| TasarError::SchemaError {
                        reason: format!("Column {name:?} expects a numeric value"),
                    })?;
                    features.push(value as f32);
                }
                ColumnSpec::Categorical { name, vocab } => {
                    let value = cell.as_str().ok_or_else(|| TasarError::SchemaError {
                        reason: format!("Column {name:?} expects a string value"),
                    })?;
                    let hot = vocab.iter().position(|entry| entry == value).ok_or_else(
                        || TasarError::UnknownCategory {
                            column: name.clone(),
                            value: value.to_string(),
                        },
                    )?;
                    for i in 0..vocab.len() {
                        features.push(if i == hot { 1.0 } else { 0.0 });
                    }
                }
            }
        }

        Ok(features)
    }
}

impl CostPredictor for LinearCostModel {
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                let features = self.encode(row)?;
                let dot: f32 = features
                    .iter()
                    .zip(self.coefficients.iter())
                    .map(|(feature, coef)| feature * coef)
                    .sum();
                Ok(f64::from(self.intercept + dot))
            })
            .collect()
    }
}

/// Metadata describing the demo model, suitable for writing a demo
/// artifact to disk.
#[must_use]
pub fn demo_metadata() -> ArtifactMetadata {
    ArtifactMetadata {
        model_type: LINEAR_REGRESSION.to_string(),
        name: Some("medcost-demo".to_string()),
        columns: demo_columns(),
        extra: std::collections::HashMap::new(),
    }
}

fn demo_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::Numeric {
            name: "age".to_string(),
        },
        ColumnSpec::Categorical {
            name: "sex".to_string(),
            vocab: vec!["female".to_string(), "male".to_string()],
        },
        ColumnSpec::Numeric {
            name: "bmi".to_string(),
        },
        ColumnSpec::Numeric {
            name: "children".to_string(),
        },
        ColumnSpec::Categorical {
            name: "smoker".to_string(),
            vocab: vec!["no".to_string(), "yes".to_string()],
        },
        ColumnSpec::Categorical {
            name: "region".to_string(),
            vocab: vec![
                "northeast".to_string(),
                "northwest".to_string(),
                "southeast".to_string(),
                "southwest".to_string(),
            ],
        },
    ]
}

/// Coefficients for the demo model, in schema order. Values approximate
/// an ordinary least squares fit of the classic insurance charges dataset.
fn demo_coefficients(columns: &[ColumnSpec]) -> Vec<f32> {
    let mut coefs = Vec::with_capacity(columns.iter().map(ColumnSpec::width).sum());
    for column in columns {
        match column.name() {
            "age" => coefs.push(256.9),
            "sex" => coefs.extend_from_slice(&[0.0, -131.3]),
            "bmi" => coefs.push(339.2),
            "children" => coefs.push(475.5),
            "smoker" => coefs.extend_from_slice(&[0.0, 23848.5]),
            "region" => coefs.extend_from_slice(&[0.0, -353.0, -1035.0, -960.0]),
            other => unreachable!("demo schema has no column {other}"),
        }
    }
    coefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;

    fn demo_row() -> Row {
        Row::new()
            .with("age", 19.0)
            .with("sex", "female")
            .with("bmi", 27.9)
            .with("children", 0i64)
            .with("smoker", "yes")
            .with("region", "southwest")
    }

    #[test]
    fn test_demo_predicts_finite_positive() {
        let model = LinearCostModel::demo();
        let charges = model.predict_one(&demo_row()).expect("prediction");
        assert!(charges.is_finite());
        assert!(charges > 0.0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let model = LinearCostModel::demo();
        let first = model.predict_one(&demo_row()).expect("prediction");
        let second = model.predict_one(&demo_row()).expect("prediction");
        assert_eq!(first, second);
    }

    #[test]
    fn test_smoker_costs_more_than_non_smoker() {
        let model = LinearCostModel::demo();
        let smoker = demo_row();
        let non_smoker = Row::new()
            .with("age", 19.0)
            .with("sex", "female")
            .with("bmi", 27.9)
            .with("children", 0i64)
            .with("smoker", "no")
            .with("region", "southwest");

        let smoker_charges = model.predict_one(&smoker).expect("prediction");
        let non_smoker_charges = model.predict_one(&non_smoker).expect("prediction");
        assert!(smoker_charges > non_smoker_charges);
    }

    #[test]
    fn test_column_order_in_row_does_not_matter() {
        let model = LinearCostModel::demo();
        let reordered = Row::new()
            .with("region", "southwest")
            .with("smoker", "yes")
            .with("children", 0i64)
            .with("bmi", 27.9)
            .with("sex", "female")
            .with("age", 19.0);

        let a = model.predict_one(&demo_row()).expect("prediction");
        let b = model.predict_one(&reordered).expect("prediction");
        assert_eq!(a, b);
    }

    #[test]
    fn test_integer_accepted_for_numeric_column() {
        let model = LinearCostModel::demo();
        let int_age = Row::new()
            .with("age", 19i64)
            .with("sex", "female")
            .with("bmi", 27.9)
            .with("children", 0i64)
            .with("smoker", "yes")
            .with("region", "southwest");
        let float_age = demo_row();

        let a = model.predict_one(&int_age).expect("prediction");
        let b = model.predict_one(&float_age).expect("prediction");
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_column_rejected() {
        let model = LinearCostModel::demo();
        let row = Row::new().with("age", 19.0); // five columns missing
        let result = model.predict_one(&row);
        assert!(matches!(result, Err(TasarError::SchemaError { .. })));
    }

    #[test]
    fn test_string_for_numeric_column_rejected() {
        let model = LinearCostModel::demo();
        let row = Row::new()
            .with("age", "nineteen")
            .with("sex", "female")
            .with("bmi", 27.9)
            .with("children", 0i64)
            .with("smoker", "yes")
            .with("region", "southwest");
        let result = model.predict_one(&row);
        assert!(matches!(result, Err(TasarError::SchemaError { .. })));
    }

    #[test]
    fn test_out_of_vocabulary_category_rejected() {
        let model = LinearCostModel::demo();
        let row = Row::new()
            .with("age", 19.0)
            .with("sex", "female")
            .with("bmi", 27.9)
            .with("children", 0i64)
            .with("smoker", "yes")
            .with("region", "atlantis");
        let result = model.predict_one(&row);
        match result {
            Err(TasarError::UnknownCategory { column, value }) => {
                assert_eq!(column, "region");
                assert_eq!(value, "atlantis");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_predict_preserves_order() {
        let model = LinearCostModel::demo();
        let young = demo_row();
        let old = Row::new()
            .with("age", 64.0)
            .with("sex", "female")
            .with("bmi", 27.9)
            .with("children", 0i64)
            .with("smoker", "yes")
            .with("region", "southwest");

        let predictions = model.predict(&[young, old]).expect("batch");
        assert_eq!(predictions.len(), 2);
        assert!(predictions[1] > predictions[0]); // age coefficient is positive
    }

    #[test]
    fn test_from_artifact_roundtrip_matches_demo() {
        let demo = LinearCostModel::demo();
        let artifact = Artifact::new(
            demo_metadata(),
            demo.intercept,
            demo.coefficients.clone(),
        )
        .expect("artifact");

        let reparsed = Artifact::from_bytes(artifact.to_bytes()).expect("roundtrip");
        let model = LinearCostModel::from_artifact(&reparsed).expect("model");

        let a = demo.predict_one(&demo_row()).expect("prediction");
        let b = model.predict_one(&demo_row()).expect("prediction");
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_artifact_rejects_wrong_model_type() {
        let mut metadata = demo_metadata();
        metadata.model_type = "gradient_boosting".to_string();
        let width = metadata.encoded_width();
        let artifact = Artifact::new(metadata, 0.0, vec![0.0; width]).expect("artifact");

        let result = LinearCostModel::from_artifact(&artifact);
        assert!(matches!(result, Err(TasarError::FormatError { .. })));
    }

    #[test]
    fn test_from_artifact_rejects_empty_schema() {
        let metadata = ArtifactMetadata {
            model_type: LINEAR_REGRESSION.to_string(),
            ..ArtifactMetadata::default()
        };
        let artifact = Artifact::new(metadata, 0.0, Vec::new()).expect("artifact");

        let result = LinearCostModel::from_artifact(&artifact);
        assert!(matches!(result, Err(TasarError::FormatError { .. })));
    }
}
