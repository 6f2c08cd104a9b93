//! Read/write the model bundle file.
//!
//! The bundle is one JSON object; the inference service loads it whole.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::export::{ExportError, ModelBundle};

/// Write `bundle` to `path`, creating parent directories. Returns the file size.
pub fn write_bundle<M, S>(bundle: &ModelBundle<M, S>, path: &Path) -> Result<u64, ExportError>
where
    M: Serialize,
    S: Serialize,
{
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer(&mut writer, bundle).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)?;
    drop(writer);

    let bytes = fs::metadata(path).map_err(io_err)?.len();
    debug!(bytes, path = %path.display(), "wrote model bundle");
    Ok(bytes)
}

/// Load a bundle back from disk.
pub fn read_bundle<M, S>(path: &Path) -> Result<ModelBundle<M, S>, ExportError>
where
    M: DeserializeOwned,
    S: DeserializeOwned,
{
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a fitted model or scaler exported as JSON.
pub fn read_fitted_json(path: &Path) -> Result<Value, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}
