//! Binary cube access.
//!
//! This module provides:
//! - `Element`: typed, byte-order-aware access to single cells
//! - `Layout`: the BIP/BIL/BSQ/one-band/spectral-library stride tables
//! - `Sel`: per-axis index expressions
//! - `EnviImage`: the `(line, sample, band)` view with reads, writes and helpers
//! - `open`, `create` and `create_filled`

mod distance;
mod element;
mod factory;
mod layout;
mod select;
mod storage;
mod view;

#[cfg(test)]
mod tests;

pub use distance::DistanceMeasure;
pub use element::Element;
pub use factory::{OpenOptions, create, create_filled, open};
pub use layout::Layout;
pub use select::Sel;
pub use view::{EnviImage, ImageKind};
