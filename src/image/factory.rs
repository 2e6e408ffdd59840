//! Entry points: open an existing image or create a new one.
//!
//! Both pick the concrete layout with the same precedence: spectral library,
//! then classification, then single band, then the declared interleave.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EnviError, Result};
use crate::header::discovery::{ImagePaths, header_path_for, locate};
use crate::header::{BandOptions, ByteOrder, ElementEncoding, EnviHeader, FileType, HeaderOverrides};
use crate::image::element::Element;
use crate::image::layout::Layout;
use crate::image::storage::CubeStorage;
use crate::image::view::{EnviImage, ImageKind};

/// Options for [`open`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    /// Convert the whole cube to this encoding in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_type: Option<ElementEncoding>,
    /// Explicit header file, bypassing discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<PathBuf>,
    /// Present bands in ascending wavelength order
    pub sort_wavelengths: bool,
    /// Hide bands flagged 0 in the bad band list
    pub use_bbl: bool,
}

impl OpenOptions {
    /// Wavelength sorting and bad band filtering switched on.
    pub fn virtualized() -> Self {
        Self {
            sort_wavelengths: true,
            use_bbl: true,
            ..Self::default()
        }
    }

    /// Convert to `encoding` on open.
    pub fn as_type(mut self, encoding: ElementEncoding) -> Self {
        self.as_type = Some(encoding);
        self
    }

    /// Use `header` instead of searching next to the image.
    pub fn with_header(mut self, header: impl Into<PathBuf>) -> Self {
        self.header = Some(header.into());
        self
    }

    fn band_options(&self) -> BandOptions {
        BandOptions {
            sort_wavelengths: self.sort_wavelengths,
            use_bbl: self.use_bbl,
        }
    }
}

/// Kind and layout for a header, or the reason none fits.
fn select_layout(header: &EnviHeader) -> std::result::Result<(ImageKind, Layout), String> {
    let file_type = header.file_type().unwrap_or_else(|e| {
        log::debug!("Ignoring file type: {e}");
        None
    });
    let kind = match file_type {
        Some(FileType::SpectralLibrary) => {
            return Ok((ImageKind::SpectralLibrary, Layout::SpectralLibrary));
        }
        Some(FileType::Classification) => ImageKind::Classification,
        _ => ImageKind::Standard,
    };
    if header.physical_bands() == 1 {
        return Ok((kind, Layout::OneBand));
    }
    header
        .interleave()
        .map(|interleave| (kind, Layout::from_interleave(interleave)))
        .map_err(|e| e.to_string())
}

/// Byte length of the cube; refuses geometries that overflow `usize`.
fn cube_len(header: &EnviHeader, encoding: ElementEncoding) -> Result<usize> {
    let (lines, samples, bands) = (header.lines(), header.samples(), header.physical_bands());
    [lines, samples, bands, encoding.size()]
        .into_iter()
        .try_fold(1usize, usize::checked_mul)
        .ok_or_else(|| {
            EnviError::GeometryMismatch(format!(
                "{lines} x {samples} x {bands} {encoding} cube does not fit in memory"
            ))
        })
}

/// Open an image read-only.
pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> Result<EnviImage> {
    let path = path.as_ref();
    let paths = match &options.header {
        Some(header) => ImagePaths {
            header: header.clone(),
            binary: path.to_path_buf(),
        },
        None => locate(path)?,
    };
    log::debug!(
        "Opening {} with header {}",
        paths.binary.display(),
        paths.header.display()
    );

    let mut header = EnviHeader::construct(
        Some(&paths.header),
        None,
        options.band_options(),
        &HeaderOverrides::new(),
    )?;
    let (kind, layout) = select_layout(&header).map_err(|reason| EnviError::UnrecognizedFile {
        path: paths.header.clone(),
        reason,
    })?;
    let encoding = header.data_type()?;
    let offset = header.take_header_offset();

    let file_order = header.byte_order();
    if file_order != ByteOrder::host() {
        log::warn!(
            "{} is stored {file_order:?}-endian; values are swapped to host order on access",
            paths.binary.display()
        );
    }

    let len = cube_len(&header, encoding)?;
    let mut storage = CubeStorage::open_read(&paths.binary, offset, len)?;
    let mut storage_order = file_order;
    if let Some(target) = options.as_type
        && target != encoding
    {
        storage = storage.converted(encoding, file_order, target)?;
        header.set_encoding(target);
        storage_order = ByteOrder::host();
    }

    EnviImage::from_parts(paths.binary, header, kind, layout, storage, storage_order)
}

/// Create a new image, zero-filled.
///
/// The header is built from `template` (its virtual view baked in) and
/// `overrides`, written to `<path>.hdr`, and only then is the binary file
/// created at its full size and mapped read-write.
pub fn create(
    path: impl AsRef<Path>,
    template: Option<&EnviHeader>,
    overrides: &HeaderOverrides,
) -> Result<EnviImage> {
    let path = path.as_ref();
    let mut header = EnviHeader::construct(None, template, BandOptions::default(), overrides)?;
    header.prepare_for_new_file();

    header.file_type()?;
    let encoding = header.data_type()?;
    let (kind, layout) = select_layout(&header).map_err(EnviError::BadHeaderValues)?;
    let len = cube_len(&header, encoding)?;

    let header_path = header_path_for(path);
    header.write(&header_path)?;
    log::debug!(
        "Creating {} ({} x {} x {} {encoding})",
        path.display(),
        header.lines(),
        header.samples(),
        header.bands()
    );

    let storage = CubeStorage::create(path, len)?;
    EnviImage::from_parts(path.to_path_buf(), header, kind, layout, storage, ByteOrder::host())
}

/// Create a new image with every element set to `value`.
pub fn create_filled<T: Element>(
    path: impl AsRef<Path>,
    template: Option<&EnviHeader>,
    overrides: &HeaderOverrides,
    value: T,
) -> Result<EnviImage> {
    let mut image = create(path, template, overrides)?;
    image.fill(value)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(bands: i64, interleave: &str) -> HeaderOverrides {
        HeaderOverrides::new()
            .set("lines", 2i64)
            .set("samples", 3i64)
            .set("bands", bands)
            .set("data_type", 4i64)
            .set("interleave", interleave)
    }

    #[test]
    fn test_layout_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let bsq = create(dir.path().join("a.dat"), None, &overrides(4, "bsq")).unwrap();
        assert_eq!(bsq.layout(), Layout::Bsq);
        assert_eq!(bsq.kind(), ImageKind::Standard);

        let single = create(dir.path().join("b.dat"), None, &overrides(1, "bil")).unwrap();
        assert_eq!(single.layout(), Layout::OneBand);

        let class = create(
            dir.path().join("c.dat"),
            None,
            &overrides(1, "bsq").set("file_type", "ENVI Classification"),
        )
        .unwrap();
        assert_eq!(class.kind(), ImageKind::Classification);
        assert_eq!(class.layout(), Layout::OneBand);
    }

    #[test]
    fn test_create_writes_header_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dat");
        let image = create(&path, None, &overrides(4, "bip")).unwrap();
        let text = std::fs::read_to_string(header_path_for(&path)).unwrap();
        assert!(text.starts_with("ENVI\n"));
        assert!(text.contains("byte order = "));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2 * 3 * 4 * 4);
        assert!(image.is_writable());
    }

    #[test]
    fn test_create_rejects_unknown_file_type() {
        let dir = tempfile::tempdir().unwrap();
        let err = create(
            dir.path().join("x.dat"),
            None,
            &overrides(4, "bip").set("file_type", "ENVI Mystery"),
        )
        .unwrap_err();
        assert!(matches!(err, EnviError::UnknownFileType(ref v) if v == "ENVI Mystery"));
        assert!(!header_path_for(&dir.path().join("x.dat")).exists());
    }

    #[test]
    fn test_create_rejects_bad_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let err = create(dir.path().join("x.dat"), None, &overrides(4, "bxp")).unwrap_err();
        assert!(matches!(err, EnviError::BadHeaderValues(_)));
    }

    #[test]
    fn test_open_rejects_bad_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.dat");
        std::fs::write(&path, [0u8; 4]).unwrap();
        std::fs::write(
            header_path_for(&path),
            "ENVI\nsamples = 1\nlines = 1\nbands = 2\ndata type = 2\ninterleave = zig\nbyte order = 0\n",
        )
        .unwrap();
        let err = open(&path, &OpenOptions::default()).unwrap_err();
        assert!(matches!(err, EnviError::UnrecognizedFile { .. }));
    }

    #[test]
    fn test_create_rejects_overflowing_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.dat");
        let err = create(&path, None, &overrides(4, "bip").set("lines", 1i64 << 62)).unwrap_err();
        assert!(matches!(err, EnviError::GeometryMismatch(_)));
        assert!(!header_path_for(&path).exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_header() {
        let dir = tempfile::tempdir().unwrap();
        let err = open(dir.path().join("nothing.dat"), &OpenOptions::default()).unwrap_err();
        assert!(matches!(err, EnviError::HeaderNotFound { .. }));
    }

    #[test]
    fn test_options_serde() {
        let options = OpenOptions::virtualized().as_type(ElementEncoding::Float64);
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"float64\""));
        let back: OpenOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
        let partial: OpenOptions = serde_json::from_str(r#"{"use_bbl": true}"#).unwrap();
        assert!(partial.use_bbl && !partial.sort_wavelengths);
    }
}
