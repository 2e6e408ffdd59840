//! Scenario tests for opening, creating and indexing ENVI images.
//!
//! These tests write real files into a temporary directory and check that
//! every index form agrees across layouts, virtual band views, byte orders
//! and spectral libraries.

mod speclib_tests;
mod virtual_band_tests;

use crate::header::HeaderOverrides;

/// Overrides for a plain float32 cube.
fn float_cube(lines: i64, samples: i64, bands: i64, interleave: &str) -> HeaderOverrides {
    HeaderOverrides::new()
        .set("lines", lines)
        .set("samples", samples)
        .set("bands", bands)
        .set("data_type", 4i64)
        .set("interleave", interleave)
}
