//! Formatted terminal output.
//!
//! Formatting lives here so the pipelines only return data and the wording can
//! change without touching them.

pub mod format;

pub use format::*;
