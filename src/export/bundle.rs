//! Model bundle packaging.
//!
//! The inference service loads one object and reads `model`, `scaler` and
//! `feature_names` from it; every other key is descriptive metadata. The
//! feature order is fixed and must match the order the service computes the
//! band statistics in.

use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ExportError;

/// Band-statistic features in the order the inference service computes them.
pub const FEATURE_NAMES: [&str; 12] = [
    "R_mean",
    "R_std",
    "G_mean",
    "G_std",
    "B_mean",
    "B_std",
    "NDVI_mean",
    "NDVI_std",
    "Built_mean",
    "Built_std",
    "Brightness_mean",
    "Brightness_std",
];

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_OUTPUT_DIR: &str = "ml-service/models";
pub const MODEL_FILE_NAME: &str = "healthcare_model.json";

/// Binary classes the building detector predicts.
pub fn default_classes() -> Vec<String> {
    vec!["Non-built".to_string(), "Built-up".to_string()]
}

/// Number of input features a fitted object expects, when it can tell.
pub trait FeatureWidth {
    fn feature_width(&self) -> Option<usize>;
}

/// Loosely-typed objects (e.g. exported from a notebook as JSON) report their
/// width through the usual fitted-attribute names.
impl FeatureWidth for Value {
    fn feature_width(&self) -> Option<usize> {
        for key in ["n_features_in_", "n_features_in", "n_features"] {
            if let Some(n) = self.get(key).and_then(Value::as_u64) {
                return usize::try_from(n).ok();
            }
        }
        ["mean_", "mean"]
            .iter()
            .find_map(|key| self.get(*key).and_then(Value::as_array).map(Vec::len))
    }
}

/// Caller-supplied facts about the classifier.
///
/// The packager never inspects the model object itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    pub model_type: String,
    pub version: String,
    pub n_estimators: Option<u32>,
    pub max_depth: Option<u32>,
    /// Feature width the model was trained on, if the model cannot report it.
    pub n_features: Option<usize>,
    pub training_samples: Option<usize>,
    pub test_samples: Option<usize>,
    pub classes: Option<Vec<String>>,
    /// Overrides today's date in `trained_on`.
    pub trained_on: Option<String>,
}

impl ModelMetadata {
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
            version: DEFAULT_VERSION.to_string(),
            n_estimators: None,
            max_depth: None,
            n_features: None,
            training_samples: None,
            test_samples: None,
            classes: None,
            trained_on: None,
        }
    }
}

/// The serialized object the inference service consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle<M, S> {
    pub model: M,
    pub scaler: S,
    pub version: String,
    pub accuracy: Option<f64>,
    pub trained_on: String,
    pub model_type: String,
    pub n_estimators: Option<u32>,
    pub max_depth: Option<u32>,
    pub feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_samples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
}

/// Where the export is written.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_name: MODEL_FILE_NAME.to_string(),
        }
    }
}

impl ExportConfig {
    pub fn model_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// Build a bundle from a fitted model and scaler.
///
/// Fails when the scaler or the model reports a feature width other than
/// `FEATURE_NAMES.len()`.
pub fn package<M, S>(
    model: M,
    scaler: S,
    metadata: ModelMetadata,
    accuracy: Option<f64>,
) -> Result<ModelBundle<M, S>, ExportError>
where
    M: FeatureWidth,
    S: FeatureWidth,
{
    let expected = FEATURE_NAMES.len();
    if let Some(found) = scaler.feature_width() {
        if found != expected {
            return Err(ExportError::FeatureWidth {
                component: "scaler",
                found,
                expected,
            });
        }
    }
    if let Some(found) = model.feature_width().or(metadata.n_features) {
        if found != expected {
            return Err(ExportError::FeatureWidth {
                component: "model",
                found,
                expected,
            });
        }
    }
    if let Some(acc) = accuracy {
        if !(0.0..=1.0).contains(&acc) {
            return Err(ExportError::InvalidInput(format!(
                "accuracy must be within [0, 1], got {acc}"
            )));
        }
    }

    Ok(ModelBundle {
        model,
        scaler,
        version: metadata.version,
        accuracy,
        trained_on: metadata
            .trained_on
            .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string()),
        model_type: metadata.model_type,
        n_estimators: metadata.n_estimators,
        max_depth: metadata.max_depth,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        training_samples: metadata.training_samples,
        test_samples: metadata.test_samples,
        classes: metadata.classes,
    })
}
