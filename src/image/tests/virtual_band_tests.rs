//! Tests for wavelength-sorted and bad-band-filtered views.

use std::path::{Path, PathBuf};

use ndarray::Array2;

use super::float_cube;
use crate::EnviError;
use crate::header::HeaderOverrides;
use crate::header::discovery::header_path_for;
use crate::image::{OpenOptions, create, create_filled, open};

/// 3 x 2 x 4 BIP cube where physical band `b` holds `10 + b` everywhere.
fn sorted_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("scene.dat");
    let overrides = float_cube(3, 2, 4, "bip")
        .set("wavelength", vec![2.0, 1.0, 3.0, 0.5])
        .set("bbl", vec![1i64, 1, 0, 1]);
    let mut image = create(&path, None, &overrides).unwrap();
    for band in 0..4 {
        let slab = Array2::from_elem((3, 2), 10.0 + band as f32);
        image.set_band(band, slab.view()).unwrap();
    }
    image.close().unwrap();
    path
}

#[test]
fn test_sorted_and_filtered_view() {
    let dir = tempfile::tempdir().unwrap();
    let image = open(sorted_fixture(dir.path()), &OpenOptions::virtualized()).unwrap();

    assert_eq!(image.bands(), 3);
    assert_eq!(image.band_index().as_slice(), &[3, 1, 0]);
    assert_eq!(image.wavelength().unwrap(), vec![0.5, 1.0, 2.0]);
    assert_eq!(image.bbl().unwrap(), vec![1, 1, 1]);

    assert_eq!(image.spectrum_at::<f32>(2, 1).unwrap().to_vec(), vec![13.0, 11.0, 10.0]);
    assert!(image.band::<f32>(2).unwrap().iter().all(|&v| v == 10.0));
    assert!(matches!(
        image.band::<f32>(3),
        Err(EnviError::OutOfBounds { axis: "band", index: 3, len: 3 })
    ));
}

#[test]
fn test_data_and_wavelength_refer_to_the_same_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = sorted_fixture(dir.path());
    let physical = open(&path, &OpenOptions::default()).unwrap();
    let physical_wavelengths = physical.wavelength().unwrap();

    for options in [
        OpenOptions { use_bbl: true, ..OpenOptions::default() },
        OpenOptions { sort_wavelengths: true, ..OpenOptions::default() },
        OpenOptions::virtualized(),
    ] {
        let image = open(&path, &options).unwrap();
        let wavelengths = image.wavelength().unwrap();
        let spectrum = image.spectrum_at::<f32>(0, 0).unwrap();
        assert_eq!(wavelengths.len(), image.bands());
        for (k, value) in spectrum.iter().enumerate() {
            let band = (*value - 10.0) as usize;
            assert_eq!(wavelengths[k], physical_wavelengths[band]);
        }
    }
}

#[test]
fn test_bbl_only_keeps_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let options = OpenOptions { use_bbl: true, ..OpenOptions::default() };
    let image = open(sorted_fixture(dir.path()), &options).unwrap();
    assert_eq!(image.band_index().as_slice(), &[0, 1, 3]);
    assert_eq!(image.wavelength().unwrap(), vec![2.0, 1.0, 0.5]);
}

#[test]
fn test_wavelength_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let image = open(sorted_fixture(dir.path()), &OpenOptions::virtualized()).unwrap();

    assert_eq!(image.wavelength_to_band_index(1.1).unwrap(), 1);
    assert_eq!(image.wavelength_to_band_index(100.0).unwrap(), 2);
    // equidistant from 0.5 and 1.0
    assert_eq!(image.wavelength_to_band_index(0.75).unwrap(), 0);
    // memoized answers are unchanged
    assert_eq!(image.wavelength_to_band_index(0.75).unwrap(), 0);
    assert!(matches!(
        image.wavelength_to_band_index(f64::NAN),
        Err(EnviError::Lookup(_))
    ));
}

#[test]
fn test_clone_bakes_in_visible_bands() {
    let dir = tempfile::tempdir().unwrap();
    let parent_path = dir.path().join("parent.dat");
    let overrides = float_cube(2, 2, 5, "bsq")
        .set("wavelength", vec![400.0, 500.0, 600.0, 700.0, 800.0])
        .set("band_names", vec!["b0", "b1", "b2", "b3", "b4"])
        .set("bbl", vec![1i64, 0, 1, 0, 1]);
    let mut parent = create(&parent_path, None, &overrides).unwrap();
    for band in 0..5 {
        parent
            .set_band(band, Array2::from_elem((2, 2), band as f32).view())
            .unwrap();
    }
    parent.close().unwrap();

    let parent = open(&parent_path, &OpenOptions { use_bbl: true, ..OpenOptions::default() }).unwrap();
    assert_eq!(parent.bands(), 3);

    let child_path = dir.path().join("child.dat");
    let mut child = create(&child_path, Some(parent.header()), &HeaderOverrides::new()).unwrap();
    assert_eq!(child.bands(), 3);
    assert_eq!(child.header().bands(), 3);
    assert_eq!(child.wavelength().unwrap(), vec![400.0, 600.0, 800.0]);
    assert_eq!(
        child.band_names().unwrap(),
        vec!["b0".to_string(), "b2".to_string(), "b4".to_string()]
    );
    child.assign(.., .., .., parent.cube::<f32>().unwrap().view()).unwrap();
    child.close().unwrap();

    let text = std::fs::read_to_string(header_path_for(&child_path)).unwrap();
    assert!(text.contains("\nbands = 3\n"));
    let reopened = open(&child_path, &OpenOptions::default()).unwrap();
    assert_eq!(reopened.spectrum_at::<f32>(1, 1).unwrap().to_vec(), vec![0.0, 2.0, 4.0]);
}

#[test]
fn test_virtual_header_refuses_geometry_changes() {
    let dir = tempfile::tempdir().unwrap();
    let image = open(sorted_fixture(dir.path()), &OpenOptions::virtualized()).unwrap();
    let mut header = image.header().clone();
    assert!(matches!(header.set_bands(2), Err(EnviError::GeometryFrozen)));
}

#[test]
fn test_hidden_single_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.dat");
    let overrides = float_cube(2, 2, 1, "bsq")
        .set("wavelength", vec![500.0])
        .set("bbl", vec![0i64]);
    drop(create_filled(&path, None, &overrides, 4.0f32).unwrap());

    let options = OpenOptions { use_bbl: true, ..OpenOptions::default() };
    let image = open(&path, &options).unwrap();
    assert_eq!(image.bands(), 0);
    assert_eq!(image.header().bands(), 0);
    assert_eq!(image.wavelength().unwrap(), Vec::<f64>::new());
    assert!(matches!(
        image.band::<f32>(0),
        Err(EnviError::OutOfBounds { axis: "band", index: 0, len: 0 })
    ));
    assert!(image.spectrum_at::<f32>(0, 0).unwrap().is_empty());

    let shown = open(&path, &OpenOptions::default()).unwrap();
    assert_eq!(shown.bands(), 1);
    assert!(shown.band::<f32>(0).unwrap().iter().all(|&v| v == 4.0));
}
