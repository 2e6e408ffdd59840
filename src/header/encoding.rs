//! Enumerated header values: element encodings, byte order, interleave and file type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EnviError, Result};

/// On-disk element encoding, one per ENVI `data type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementEncoding {
    /// Unsigned 8-bit integer (code 1)
    UInt8,
    /// Signed 16-bit integer (code 2)
    Int16,
    /// Signed 32-bit integer (code 3)
    Int32,
    /// 32-bit float (code 4)
    Float32,
    /// 64-bit float (code 5)
    Float64,
    /// Pair of 32-bit floats (code 6)
    Complex32,
    /// Pair of 64-bit floats (code 9)
    Complex64,
    /// Unsigned 16-bit integer (code 12)
    UInt16,
    /// Unsigned 32-bit integer (code 13)
    UInt32,
    /// Signed 64-bit integer (code 14)
    Int64,
    /// Unsigned 64-bit integer (code 15)
    UInt64,
}

impl ElementEncoding {
    /// Every encoding, in ENVI code order.
    pub const ALL: [Self; 11] = [
        Self::UInt8,
        Self::Int16,
        Self::Int32,
        Self::Float32,
        Self::Float64,
        Self::Complex32,
        Self::Complex64,
        Self::UInt16,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
    ];

    /// Map an ENVI `data type` code to its encoding.
    pub fn from_envi_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::UInt8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::Float32),
            5 => Ok(Self::Float64),
            6 => Ok(Self::Complex32),
            9 => Ok(Self::Complex64),
            12 => Ok(Self::UInt16),
            13 => Ok(Self::UInt32),
            14 => Ok(Self::Int64),
            15 => Ok(Self::UInt64),
            other => Err(EnviError::UnknownDataType(other)),
        }
    }

    /// ENVI `data type` code for this encoding.
    pub const fn envi_code(self) -> i64 {
        match self {
            Self::UInt8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 3,
            Self::Float32 => 4,
            Self::Float64 => 5,
            Self::Complex32 => 6,
            Self::Complex64 => 9,
            Self::UInt16 => 12,
            Self::UInt32 => 13,
            Self::Int64 => 14,
            Self::UInt64 => 15,
        }
    }

    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex32 => 8,
            Self::Complex64 => 16,
        }
    }

    /// Whether elements carry an imaginary part.
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex32 | Self::Complex64)
    }

    /// Lower-case name of the encoding.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex32 => "complex32",
            Self::Complex64 => "complex64",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
        }
    }
}

impl fmt::Display for ElementEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementEncoding {
    type Err = EnviError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        // "byte" is the single-byte alias of uint8
        if lower == "byte" {
            return Ok(Self::UInt8);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name() == lower)
            .ok_or_else(|| EnviError::invalid_attribute("data_type", format!("unknown encoding '{s}'")))
    }
}

/// Byte order of the binary cube (`byte order` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first (code 0)
    Little,
    /// Most significant byte first (code 1)
    Big,
}

impl ByteOrder {
    /// Byte order of the running host.
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Map the header code to a byte order.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Little),
            1 => Ok(Self::Big),
            other => Err(EnviError::UnknownByteOrder(other)),
        }
    }

    /// Header code for this byte order.
    pub const fn code(self) -> i64 {
        match self {
            Self::Little => 0,
            Self::Big => 1,
        }
    }
}

/// Physical band ordering of a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interleave {
    /// Band interleaved by pixel
    Bip,
    /// Band interleaved by line
    Bil,
    /// Band sequential
    Bsq,
}

impl Interleave {
    /// Lower-case tag as written in headers.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Bip => "bip",
            Self::Bil => "bil",
            Self::Bsq => "bsq",
        }
    }
}

impl FromStr for Interleave {
    type Err = EnviError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bip" => Ok(Self::Bip),
            "bil" => Ok(Self::Bil),
            "bsq" => Ok(Self::Bsq),
            _ => Err(EnviError::UnknownInterleave(s.to_string())),
        }
    }
}

/// Recognized `file type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `ENVI Standard` (also the bare interleave tags)
    Standard,
    /// `ENVI Classification`
    Classification,
    /// `ENVI Spectral Library`
    SpectralLibrary,
    /// `Other`
    Other,
}

impl FileType {
    /// Canonical header spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "ENVI Standard",
            Self::Classification => "ENVI Classification",
            Self::SpectralLibrary => "ENVI Spectral Library",
            Self::Other => "Other",
        }
    }
}

impl FromStr for FileType {
    type Err = EnviError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "envi standard" | "bip" | "bil" | "bsq" => Ok(Self::Standard),
            "envi classification" => Ok(Self::Classification),
            "envi spectral library" => Ok(Self::SpectralLibrary),
            "other" => Ok(Self::Other),
            _ => Err(EnviError::UnknownFileType(s.to_string())),
        }
    }
}
