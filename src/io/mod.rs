//! File helpers for the model bundle.
//!
//! - bundle and fitted-object JSON read/write (`bundle`)
//! - lookup of an already exported bundle (`locate`)

pub mod bundle;
pub mod locate;

pub use bundle::*;
pub use locate::*;
