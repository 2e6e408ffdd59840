//! Distance measures between two spectra.
//!
//! The NaN-tolerant form of each measure drops every band position where
//! either spectrum is non-finite before reducing.

use crate::error::{EnviError, Result};

/// Supported spectral distance measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceMeasure {
    /// Angle between the spectra as vectors, in radians
    SpectralAngle,
    /// L2 distance
    Euclidean,
    /// Absolute difference of mean intensities
    IntensityDifference,
    /// Spectral information divergence (symmetric KL of normalized spectra)
    InformationDivergence,
    /// Bray-Curtis dissimilarity
    BrayCurtis,
}

impl DistanceMeasure {
    /// Every measure.
    pub const ALL: [Self; 5] = [
        Self::SpectralAngle,
        Self::Euclidean,
        Self::IntensityDifference,
        Self::InformationDivergence,
        Self::BrayCurtis,
    ];

    /// Distance over all band positions.
    pub fn apply(self, a: &[f64], b: &[f64]) -> Result<f64> {
        check_lengths(a, b)?;
        Ok(self.reduce(a, b))
    }

    /// Distance over band positions where both spectra are finite.
    pub fn apply_nan(self, a: &[f64], b: &[f64]) -> Result<f64> {
        check_lengths(a, b)?;
        let (fa, fb): (Vec<f64>, Vec<f64>) = a
            .iter()
            .zip(b)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .unzip();
        Ok(self.reduce(&fa, &fb))
    }

    fn reduce(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::SpectralAngle => spectral_angle(a, b),
            Self::Euclidean => euclidean(a, b),
            Self::IntensityDifference => intensity_difference(a, b),
            Self::InformationDivergence => information_divergence(a, b),
            Self::BrayCurtis => bray_curtis(a, b),
        }
    }
}

fn check_lengths(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(EnviError::shape_mismatch(&[a.len()], &[b.len()]))
    }
}

fn spectral_angle(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    (dot / (na * nb)).clamp(-1.0, 1.0).acos()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn intensity_difference(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    (a.iter().sum::<f64>() / n - b.iter().sum::<f64>() / n).abs()
}

fn information_divergence(a: &[f64], b: &[f64]) -> f64 {
    let sa: f64 = a.iter().sum();
    let sb: f64 = b.iter().sum();
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let p = x / sa;
            let q = y / sb;
            p * (p / q).ln() + q * (q / p).ln()
        })
        .sum()
}

fn bray_curtis(a: &[f64], b: &[f64]) -> f64 {
    let num: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
    let den: f64 = a.iter().zip(b).map(|(x, y)| (x + y).abs()).sum();
    num / den
}
