//! Physical layouts of a cube and their stride tables.
//!
//! Every layout is addressed with the same logical `(line, sample, band)`
//! coordinates; the layout only decides how far apart neighbours are on disk.

use crate::header::Interleave;

/// Physical arrangement of a binary cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Stored `(lines, samples, bands)`
    Bip,
    /// Stored `(lines, bands, samples)`
    Bil,
    /// Stored `(bands, lines, samples)`
    Bsq,
    /// Stored `(lines, samples)`; any band index addresses the single band
    OneBand,
    /// Stored `(spectra, values)`: lines are spectra, bands are values, one sample
    SpectralLibrary,
}

impl Layout {
    /// Layout for a multi-band image with the given interleave.
    pub fn from_interleave(interleave: Interleave) -> Self {
        match interleave {
            Interleave::Bip => Self::Bip,
            Interleave::Bil => Self::Bil,
            Interleave::Bsq => Self::Bsq,
        }
    }

    /// Element strides `[line, sample, band]` for a cube with the given
    /// logical sizes (`bands` being the physical band count).
    pub fn strides(self, lines: usize, samples: usize, bands: usize) -> [usize; 3] {
        match self {
            Self::Bip => [samples * bands, bands, 1],
            Self::Bil => [bands * samples, 1, samples],
            Self::Bsq => [samples, 1, lines * samples],
            Self::OneBand => [samples, 1, 0],
            Self::SpectralLibrary => [bands, 0, 1],
        }
    }

    /// Shape of the stored array, outermost axis first.
    pub fn physical_shape(self, lines: usize, samples: usize, bands: usize) -> Vec<usize> {
        match self {
            Self::Bip => vec![lines, samples, bands],
            Self::Bil => vec![lines, bands, samples],
            Self::Bsq => vec![bands, lines, samples],
            Self::OneBand => vec![lines, samples],
            Self::SpectralLibrary => vec![lines, bands],
        }
    }

    /// Whether band indices are ignored.
    pub fn is_single_band(self) -> bool {
        matches!(self, Self::OneBand)
    }
}
