//! Locating the header that belongs to an image file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{EnviError, Result};

/// Header and binary cube paths of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePaths {
    /// Header text file
    pub header: PathBuf,
    /// Binary cube
    pub binary: PathBuf,
}

fn has_header_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("hdr"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Header path written next to a new image: the first discovery candidate.
pub fn header_path_for(image: &Path) -> PathBuf {
    with_suffix(image, ".hdr")
}

/// Candidate header paths for `image`, in lookup order:
/// `foo.dat.hdr`, `foo.hdr`, `foo.dat.HDR`, `foo.HDR`.
pub fn header_candidates(image: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(4);
    for ext in ["hdr", "HDR"] {
        for candidate in [with_suffix(image, &format!(".{ext}")), image.with_extension(ext)] {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Find the header and binary paths for `image`.
///
/// `image` may name the header itself (`foo.hdr`), in which case the binary
/// is the same path without the extension. When no candidate exists, `image`
/// is read as its own header.
pub fn locate(image: &Path) -> Result<ImagePaths> {
    if has_header_extension(image) && image.is_file() {
        return Ok(ImagePaths {
            header: image.to_path_buf(),
            binary: image.with_extension(""),
        });
    }

    let candidates = header_candidates(image);
    for candidate in &candidates {
        log::trace!("Looking for header {}", candidate.display());
        if candidate.is_file() {
            return Ok(ImagePaths {
                header: candidate.clone(),
                binary: image.to_path_buf(),
            });
        }
    }

    if image.is_file() {
        log::debug!("No header next to {}, reading it as a header", image.display());
        return Ok(ImagePaths {
            header: image.to_path_buf(),
            binary: image.with_extension(""),
        });
    }

    let mut tried = candidates;
    tried.push(image.to_path_buf());
    Err(EnviError::HeaderNotFound {
        image: image.to_path_buf(),
        tried,
    })
}
