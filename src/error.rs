//! Application-level error carrying the process exit status.
//!
//! Component modules return their own `thiserror` enums; those are converted
//! here at the boundary so `main` only has to print and exit.

use crate::data::ServiceError;
use crate::export::ExportError;
use crate::raster::MosaicError;

/// Exit status used for every failure (including a declined confirmation).
pub const EXIT_FAILURE: u8 = 1;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(EXIT_FAILURE, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self::failure(format!("Earth Engine: {err}"))
    }
}

impl From<MosaicError> for AppError {
    fn from(err: MosaicError) -> Self {
        Self::failure(format!("Merge failed: {err}"))
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        Self::failure(format!("Model export failed: {err}"))
    }
}
