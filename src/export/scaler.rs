use serde::{Deserialize, Serialize};

use super::ExportError;
use super::bundle::FeatureWidth;

/// Per-feature standardization: `(x - mean) / scale`.
///
/// Uses the population standard deviation; constant features get a scale of 1
/// so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub n_samples_seen: usize,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ExportError> {
        let first = rows
            .first()
            .ok_or_else(|| ExportError::InvalidInput("cannot fit scaler on zero rows".into()))?;
        let width = first.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(ExportError::InvalidInput(format!(
                "row {bad} has {} features, expected {width}",
                rows[bad].len()
            )));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *acc += (v - m).powi(2);
            }
        }
        let scale = var
            .into_iter()
            .map(|s| {
                let sd = (s / n).sqrt();
                if sd > f64::EPSILON { sd } else { 1.0 }
            })
            .collect();

        Ok(Self {
            mean,
            scale,
            n_samples_seen: rows.len(),
        })
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ExportError> {
        if row.len() != self.mean.len() {
            return Err(ExportError::FeatureWidth {
                component: "input row",
                found: row.len(),
                expected: self.mean.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

impl FeatureWidth for StandardScaler {
    fn feature_width(&self) -> Option<usize> {
        Some(self.mean.len())
    }
}
