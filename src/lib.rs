//! envi_cube - ENVI raster storage
//!
//! Reads, writes and memory-maps ENVI hyperspectral images: the text header
//! next to a raw binary cube. Every image is indexed as
//! `(line, sample, band)` whatever its interleave, and bands can be viewed
//! sorted by wavelength or with the bad band list applied.
//!
//! ```no_run
//! use envi_cube::{OpenOptions, open};
//!
//! let image = open("scene.dat", &OpenOptions::virtualized())?;
//! let spectrum = image.spectrum_at::<f32>(10, 20)?;
//! println!("{} bands, first value {}", image.bands(), spectrum[0]);
//! # Ok::<(), envi_cube::EnviError>(())
//! ```

pub mod config;
pub mod error;
pub mod header;
pub mod image;

pub use error::{EnviError, Result};
pub use header::{EnviHeader, HeaderOverrides};
pub use image::{EnviImage, OpenOptions, Sel, create, create_filled, open};
