//! ENVI header text format and header model.
//!
//! This module provides:
//! - `HeaderValue` and the nested `{...}` list grammar
//! - Line-oriented parsing and serialization of header text
//! - `EnviHeader`: ordered attributes, typed accessors, overrides and cloning
//! - `VirtualBandIndex`: wavelength-sorted and bad-band-filtered band views
//! - Header file discovery next to an image

pub mod discovery;
mod encoding;
mod model;
pub mod text;
mod value;
mod virtual_bands;

pub use encoding::{ByteOrder, ElementEncoding, FileType, Interleave};
pub use model::{EnviHeader, HeaderOverrides};
pub use value::{HeaderValue, format_list, parse_list};
pub use virtual_bands::{BandOptions, VirtualBandIndex};
