//! Virtual band index: visible band position to physical band position.

use crate::error::{EnviError, Result};

/// Band policy applied when a header is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandOptions {
    /// Order visible bands by ascending wavelength (stable)
    pub sort_wavelengths: bool,
    /// Hide bands whose bad-band-list entry is 0
    pub use_bbl: bool,
}

impl BandOptions {
    /// Whether any virtualization is requested.
    pub fn is_virtual(&self) -> bool {
        self.sort_wavelengths || self.use_bbl
    }
}

/// Immutable mapping from visible band index to physical band index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualBandIndex {
    physical_bands: usize,
    map: Vec<usize>,
}

impl VirtualBandIndex {
    /// One visible band per physical band, in file order.
    pub fn identity(physical_bands: usize) -> Self {
        Self {
            physical_bands,
            map: (0..physical_bands).collect(),
        }
    }

    /// Build the index from per-band metadata.
    ///
    /// Missing wavelengths default to `0..bands`, a missing bad band list to
    /// all good. Both must otherwise have exactly `physical_bands` entries.
    pub fn build(
        physical_bands: usize,
        wavelengths: Option<&[f64]>,
        bbl: Option<&[i64]>,
        options: BandOptions,
    ) -> Result<Self> {
        if let Some(w) = wavelengths
            && w.len() != physical_bands
        {
            return Err(EnviError::GeometryMismatch(format!(
                "{} wavelengths for {physical_bands} bands",
                w.len()
            )));
        }
        if let Some(b) = bbl
            && options.use_bbl
            && b.len() != physical_bands
        {
            return Err(EnviError::GeometryMismatch(format!(
                "{} bad band list entries for {physical_bands} bands",
                b.len()
            )));
        }

        let mut map: Vec<usize> = (0..physical_bands)
            .filter(|&i| !options.use_bbl || bbl.is_none_or(|b| b[i] != 0))
            .collect();

        if options.sort_wavelengths {
            let wavelength = |i: usize| wavelengths.map_or(i as f64, |w| w[i]);
            map.sort_by(|&a, &b| wavelength(a).total_cmp(&wavelength(b)));
        }

        Ok(Self {
            physical_bands,
            map,
        })
    }

    /// Number of visible bands.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether every band is hidden.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Physical band count the index was computed against.
    pub fn physical_bands(&self) -> usize {
        self.physical_bands
    }

    /// Physical indices in visible order.
    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }

    /// Whether visible and physical order coincide.
    pub fn is_identity(&self) -> bool {
        self.map.len() == self.physical_bands && self.map.iter().enumerate().all(|(v, &p)| v == p)
    }

    /// Translate a visible band index.
    pub fn physical(&self, visible: usize) -> Result<usize> {
        self.map
            .get(visible)
            .copied()
            .ok_or(EnviError::OutOfBounds {
                axis: "band",
                index: visible,
                len: self.map.len(),
            })
    }

    /// Reorder a per-band sequence into visible order.
    pub fn project<T: Clone>(&self, values: &[T]) -> Vec<T> {
        self.map.iter().map(|&i| values[i].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: BandOptions = BandOptions {
        sort_wavelengths: true,
        use_bbl: true,
    };

    #[test]
    fn test_identity() {
        let index = VirtualBandIndex::identity(3);
        assert_eq!(index.as_slice(), &[0, 1, 2]);
        assert!(index.is_identity());
    }

    #[test]
    fn test_sort_and_filter() {
        let wavelengths = [2.0, 1.0, 3.0, 0.5];
        let bbl = [1, 1, 0, 1];
        let index = VirtualBandIndex::build(4, Some(&wavelengths), Some(&bbl), BOTH).unwrap();
        assert_eq!(index.as_slice(), &[3, 1, 0]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.physical(2).unwrap(), 0);
        assert!(matches!(index.physical(3), Err(EnviError::OutOfBounds { .. })));
        assert!(!index.is_identity());
    }

    #[test]
    fn test_bbl_ignored_without_use_bbl() {
        let options = BandOptions {
            sort_wavelengths: true,
            use_bbl: false,
        };
        let index = VirtualBandIndex::build(3, Some(&[3.0, 1.0, 2.0]), Some(&[0, 0]), options).unwrap();
        assert_eq!(index.as_slice(), &[1, 2, 0]);
    }

    #[test]
    fn test_stable_sort_on_ties() {
        let index = VirtualBandIndex::build(4, Some(&[5.0, 1.0, 5.0, 1.0]), None, BOTH).unwrap();
        assert_eq!(index.as_slice(), &[1, 3, 0, 2]);
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let index = VirtualBandIndex::build(3, None, None, BOTH).unwrap();
        assert!(index.is_identity());
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        assert!(VirtualBandIndex::build(3, Some(&[1.0, 2.0]), None, BOTH).is_err());
        assert!(VirtualBandIndex::build(3, None, Some(&[1, 1]), BOTH).is_err());
    }

    #[test]
    fn test_project() {
        let index = VirtualBandIndex::build(4, Some(&[2.0, 1.0, 3.0, 0.5]), Some(&[1, 1, 0, 1]), BOTH)
            .unwrap();
        let names = ["a", "b", "c", "d"];
        assert_eq!(index.project(&names), vec!["d", "b", "a"]);
    }
}
