//! Model bundle assembly for the inference service.

pub mod bundle;
pub mod dummy;
pub mod scaler;

use std::path::PathBuf;

use thiserror::Error;

pub use bundle::*;
pub use dummy::{DUMMY_SEED, PriorClassifier, dummy_bundle};
pub use scaler::StandardScaler;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{component} expects {found} features, bundle has {expected}")]
    FeatureWidth {
        component: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("{0}")]
    InvalidInput(String),
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode or decode '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
