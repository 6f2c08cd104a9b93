use std::path::{Path, PathBuf};

use crate::export::DEFAULT_OUTPUT_DIR;

/// Places an exported model usually ends up, relative to `root`, in lookup order.
pub fn default_candidates(root: &Path, file_name: &str) -> Vec<PathBuf> {
    vec![
        root.join("models").join(file_name),
        root.join("..").join(DEFAULT_OUTPUT_DIR).join(file_name),
        root.join(DEFAULT_OUTPUT_DIR).join(file_name),
    ]
}

/// First candidate that is an existing file.
pub fn find_existing_export(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}
