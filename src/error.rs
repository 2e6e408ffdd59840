//! Error types for ENVI header and image operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, writing or indexing ENVI files.
#[derive(Error, Debug)]
pub enum EnviError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file written by a newer version
    #[error("Configuration file version {found} is newer than supported version {supported}")]
    ConfigVersion {
        /// Version stored in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// No header file was found next to an image
    #[error("Header not found for {image:?} (tried {tried:?})")]
    HeaderNotFound {
        /// Image path the lookup started from
        image: PathBuf,
        /// Every candidate header path that was tried
        tried: Vec<PathBuf>,
    },

    /// The header exists but the binary cube does not
    #[error("Binary file not found: {path:?}")]
    BinaryNotFound {
        /// Expected location of the binary cube
        path: PathBuf,
    },

    /// Header text could not be parsed
    #[error("Malformed header at line {line}: {message}")]
    MalformedHeader {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Brace-list value could not be parsed
    #[error("Invalid list syntax ({message}) in {text:?}")]
    ListSyntax {
        /// The offending value text
        text: String,
        /// Description of the problem
        message: String,
    },

    /// ENVI data type code outside the known set
    #[error("Unknown ENVI data type code: {0}")]
    UnknownDataType(i64),

    /// Byte order other than 0 or 1
    #[error("Unknown byte order: {0} (expected 0 or 1)")]
    UnknownByteOrder(i64),

    /// `file type` value that no image kind handles
    #[error("Unrecognized file type '{0}'")]
    UnknownFileType(String),

    /// `interleave` value other than bip, bil or bsq
    #[error("Unrecognized interleave '{0}'")]
    UnknownInterleave(String),

    /// Header geometry does not select any image kind (opening)
    #[error("File not recognized: {path:?}: {reason}")]
    UnrecognizedFile {
        /// Image path
        path: PathBuf,
        /// Why no image kind matched
        reason: String,
    },

    /// Header geometry does not select any image kind (creating)
    #[error("Bad header values: {0}")]
    BadHeaderValues(String),

    /// Required attribute is absent
    #[error("Missing required header attribute: {0}")]
    MissingAttribute(String),

    /// Attribute present but holding an unusable value
    #[error("Invalid value for header attribute '{key}': {message}")]
    InvalidAttribute {
        /// Normalized attribute name
        key: String,
        /// Description of the problem
        message: String,
    },

    /// Spectral library header given a band count other than one
    #[error("ENVI Speclib header should have bands=1, got {0}")]
    SpeclibBands(i64),

    /// Index outside an axis
    #[error("Index {index} out of range for {axis} axis of length {len}")]
    OutOfBounds {
        /// Axis name ("line", "sample", "band")
        axis: &'static str,
        /// Requested index
        index: usize,
        /// Axis length
        len: usize,
    },

    /// Assigned array does not match the addressed region
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Shape of the addressed region
        expected: Vec<usize>,
        /// Shape of the supplied data
        found: Vec<usize>,
    },

    /// Header geometry disagrees with itself or with the binary file
    #[error("Geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Geometry change requested on a header that carries a virtual band index
    #[error("Header geometry is frozen once a virtual band index exists")]
    GeometryFrozen,

    /// Spectral library name lookup failed
    #[error("Spectrum not found: '{0}'")]
    SpectrumNotFound(String),

    /// Any other lookup failure (wavelength, class value, ...)
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Write attempted through a read-only mapping
    #[error("Image is read-only: {path:?}")]
    ReadOnly {
        /// Image path
        path: PathBuf,
    },

    /// Access after `close()`
    #[error("Image has been closed")]
    Closed,

    /// Operation needs real-valued data
    #[error("Complex-valued data is not supported by {0}")]
    ComplexData(&'static str),
}

impl EnviError {
    /// Create a malformed header error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            line,
            message: message.into(),
        }
    }

    /// Create a list syntax error.
    pub fn list_syntax(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ListSyntax {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: &[usize], found: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EnviError>;
