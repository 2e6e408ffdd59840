//! Tests for spectral libraries: role swap, names and on-disk layout.

use std::path::{Path, PathBuf};

use super::float_cube;
use crate::EnviError;
use crate::header::discovery::header_path_for;
use crate::header::{BandOptions, EnviHeader, HeaderOverrides};
use crate::image::{ImageKind, Layout, OpenOptions, Sel, create, open};

const SPECLIB: &str = "ENVI
description = {Field spectra}
samples = 4
lines = 3
bands = 1
header offset = 0
file type = ENVI Spectral Library
data type = 4
interleave = bsq
byte order = 0
wavelength units = Nanometers
wavelength = {900.0, 450.0, 650.0, 550.0}
spectra names = {grass, soil, water}
";

fn speclib_overrides() -> HeaderOverrides {
    HeaderOverrides::new()
        .set("file_type", "ENVI Spectral Library")
        .set("lines", 3i64)
        .set("bands", 4i64)
        .set("samples", 1i64)
        .set("data_type", 4i64)
        .set("wavelength", vec![900.0, 450.0, 650.0, 550.0])
        .set("spectra_names", vec!["grass", "soil", "water"])
}

/// Library whose spectrum `i` holds `[10 i, 10 i + 1, 10 i + 2, 10 i + 3]`.
fn library(dir: &Path) -> PathBuf {
    let path = dir.join("library.sli");
    let mut image = create(&path, None, &speclib_overrides()).unwrap();
    for line in 0..3 {
        let base = 10.0 * line as f32;
        image
            .set_spectrum(line, 0, &[base, base + 1.0, base + 2.0, base + 3.0])
            .unwrap();
    }
    image.close().unwrap();
    path
}

#[test]
fn test_parsed_roles_are_swapped() {
    let header = EnviHeader::parse(SPECLIB, BandOptions::default()).unwrap();
    assert!(header.is_speclib());
    assert_eq!(header.lines(), 3);
    assert_eq!(header.bands(), 4);
    assert_eq!(header.samples(), 1);
    assert_eq!(header.wavelength().unwrap().len(), 4);
}

#[test]
fn test_samples_other_than_one_is_rejected() {
    let overrides = speclib_overrides().set("samples", 3i64);
    let err = EnviHeader::construct(None, None, BandOptions::default(), &overrides).unwrap_err();
    assert!(matches!(err, EnviError::SpeclibBands(3)));
    assert_eq!(err.to_string(), "ENVI Speclib header should have bands=1, got 3");

    let text = SPECLIB.replace("bands = 1", "bands = 2");
    assert!(matches!(
        EnviHeader::parse(&text, BandOptions::default()),
        Err(EnviError::SpeclibBands(2))
    ));
}

#[test]
fn test_written_header_keeps_disk_roles() {
    let dir = tempfile::tempdir().unwrap();
    let path = library(dir.path());
    let text = std::fs::read_to_string(header_path_for(&path)).unwrap();
    assert!(text.contains("\nsamples = 4\n"));
    assert!(text.contains("\nbands = 1\n"));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 3 * 4 * 4);
}

#[test]
fn test_open_library() {
    let dir = tempfile::tempdir().unwrap();
    let image = open(library(dir.path()), &OpenOptions::default()).unwrap();

    assert_eq!(image.kind(), ImageKind::SpectralLibrary);
    assert_eq!(image.layout(), Layout::SpectralLibrary);
    assert_eq!(image.shape(), (3, 1, 4));
    assert_eq!(
        image.spectra_names().unwrap(),
        vec!["grass".to_string(), "soil".to_string(), "water".to_string()]
    );
    assert_eq!(image.spectrum_index("water").unwrap(), 2);
    assert_eq!(
        image.spectrum_named::<f32>("soil").unwrap().to_vec(),
        vec![10.0, 11.0, 12.0, 13.0]
    );
    assert_eq!(image.value_at::<f32>(2, 0, 1).unwrap(), 21.0);
}

#[test]
fn test_names_resolve_element_wise() {
    let dir = tempfile::tempdir().unwrap();
    let image = open(library(dir.path()), &OpenOptions::default()).unwrap();

    let picked = image.select::<f32>(vec!["water", "grass"], 0, 3).unwrap();
    assert_eq!(picked.shape(), &[2, 1, 1]);
    assert_eq!(picked[[0, 0, 0]], 23.0);
    assert_eq!(picked[[1, 0, 0]], 3.0);

    let by_name = image.select::<f32>("soil", .., ..).unwrap();
    let by_index = image.select::<f32>(1, .., ..).unwrap();
    assert_eq!(by_name, by_index);

    assert!(matches!(
        image.select::<f32>(Sel::from("sand"), 0, 0),
        Err(EnviError::SpectrumNotFound(ref name)) if name == "sand"
    ));
}

#[test]
fn test_sorted_library() {
    let dir = tempfile::tempdir().unwrap();
    let options = OpenOptions { sort_wavelengths: true, ..OpenOptions::default() };
    let image = open(library(dir.path()), &options).unwrap();
    assert_eq!(image.wavelength().unwrap(), vec![450.0, 550.0, 650.0, 900.0]);
    assert_eq!(
        image.spectrum_named::<f32>("grass").unwrap().to_vec(),
        vec![1.0, 3.0, 2.0, 0.0]
    );
}

#[test]
fn test_names_need_a_library() {
    let dir = tempfile::tempdir().unwrap();
    let image = create(dir.path().join("plain.dat"), None, &float_cube(2, 2, 2, "bip")).unwrap();
    assert!(matches!(image.spectrum_index("grass"), Err(EnviError::Lookup(_))));
}
