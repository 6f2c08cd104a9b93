//! Placeholder model for exercising the inference service before a real
//! classifier exists.
//!
//! Features are uniform noise and labels are coin flips, so the classifier
//! can only learn the class prior. It still round-trips through the same
//! bundle layout as a trained model.

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ExportError;
use super::bundle::{FEATURE_NAMES, FeatureWidth, ModelBundle, ModelMetadata, default_classes, package};
use super::scaler::StandardScaler;

pub const DUMMY_SEED: u64 = 42;
pub const DUMMY_SAMPLES: usize = 100;
pub const DUMMY_TREES: u32 = 10;
pub const DUMMY_MAX_DEPTH: u32 = 5;
pub const DUMMY_VERSION: &str = "0.0.1-dummy";
pub const DUMMY_TRAINED_ON: &str = "DUMMY MODEL - NOT TRAINED";
/// Coin-flip accuracy reported for the untrained placeholder.
pub const DUMMY_ACCURACY: f64 = 0.5;

/// Predicts the training class frequencies for every input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorClassifier {
    pub class_prior: Vec<f64>,
    pub n_features: usize,
}

impl PriorClassifier {
    pub fn fit(rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<Self, ExportError> {
        if rows.len() != labels.len() || rows.is_empty() {
            return Err(ExportError::InvalidInput(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(ExportError::InvalidInput(format!(
                "label {bad} out of range for {n_classes} classes"
            )));
        }

        let mut counts = vec![0usize; n_classes];
        for &l in labels {
            counts[l] += 1;
        }
        let total = labels.len() as f64;
        Ok(Self {
            class_prior: counts.into_iter().map(|c| c as f64 / total).collect(),
            n_features: rows[0].len(),
        })
    }

    pub fn predict_proba(&self, _row: &[f64]) -> &[f64] {
        &self.class_prior
    }

    /// Index of the most frequent class.
    pub fn predict(&self, row: &[f64]) -> usize {
        self.predict_proba(row)
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0
    }
}

impl FeatureWidth for PriorClassifier {
    fn feature_width(&self) -> Option<usize> {
        Some(self.n_features)
    }
}

/// Seeded random training set: `DUMMY_SAMPLES` rows of uniform features and
/// binary labels.
pub fn synthetic_data(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..DUMMY_SAMPLES)
        .map(|_| (0..FEATURE_NAMES.len()).map(|_| rng.r#gen::<f64>()).collect())
        .collect();
    let labels = (0..DUMMY_SAMPLES).map(|_| rng.gen_range(0..2)).collect();
    (rows, labels)
}

/// Share of `labels` the classifier reproduces on its own training rows.
pub fn training_accuracy(model: &PriorClassifier, rows: &[Vec<f64>], labels: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let hits = rows
        .iter()
        .zip(labels)
        .filter(|&(row, &label)| model.predict(row) == label)
        .count();
    hits as f64 / rows.len() as f64
}

pub fn dummy_bundle(seed: u64) -> Result<ModelBundle<PriorClassifier, StandardScaler>, ExportError> {
    let (rows, labels) = synthetic_data(seed);
    let scaler = StandardScaler::fit(&rows)?;
    let scaled = rows
        .iter()
        .map(|r| scaler.transform(r))
        .collect::<Result<Vec<_>, _>>()?;
    let classes = default_classes();
    let model = PriorClassifier::fit(&scaled, &labels, classes.len())?;
    info!(
        samples = rows.len(),
        prior = ?model.class_prior,
        training_accuracy = training_accuracy(&model, &scaled, &labels),
        "fitted placeholder classifier"
    );

    let metadata = ModelMetadata {
        version: DUMMY_VERSION.to_string(),
        n_estimators: Some(DUMMY_TREES),
        max_depth: Some(DUMMY_MAX_DEPTH),
        training_samples: Some(rows.len()),
        test_samples: Some(0),
        classes: Some(classes),
        trained_on: Some(DUMMY_TRAINED_ON.to_string()),
        ..ModelMetadata::new("RandomForestClassifier")
    };
    package(model, scaler, metadata, Some(DUMMY_ACCURACY))
}
