//! Tiling: split the extent into cells and fetch one file per cell.

pub mod fetch;
pub mod grid;

#[cfg(test)]
pub(crate) mod fakes;

pub use fetch::*;
pub use grid::*;
