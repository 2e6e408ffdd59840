//! Backing storage of a cube: a memory map or an owned buffer.
//!
//! The storage owns its mapping exclusively. `release` flushes writable maps
//! and drops the mapping; it is idempotent and also runs on drop.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};

use crate::error::{EnviError, Result};
use crate::header::{ByteOrder, ElementEncoding};
use crate::image::element::convert_buffer;

enum Backing {
    ReadOnly(Mmap),
    Writable(MmapMut),
    Owned(Vec<u8>),
    Released,
}

/// Bytes of one binary cube.
pub(crate) struct CubeStorage {
    path: PathBuf,
    backing: Backing,
    offset: usize,
    len: usize,
}

impl CubeStorage {
    /// Map `len` bytes starting at `offset` of an existing file, read-only.
    #[allow(unsafe_code)]
    pub(crate) fn open_read(path: &Path, offset: usize, len: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EnviError::BinaryNotFound {
                path: path.to_path_buf(),
            },
            _ => EnviError::Io(e),
        })?;

        let file_len = file.metadata()?.len();
        let needed = offset.checked_add(len).ok_or_else(|| {
            EnviError::GeometryMismatch(format!(
                "header offset {offset} plus {len} cube bytes overflows"
            ))
        })?;
        let needed_bytes = needed as u64;
        if file_len < needed_bytes {
            return Err(EnviError::GeometryMismatch(format!(
                "{} holds {file_len} bytes, header geometry needs {needed}",
                path.display()
            )));
        }
        if file_len > needed_bytes {
            log::warn!(
                "{} holds {} bytes more than the header geometry describes",
                path.display(),
                file_len - needed_bytes
            );
        }

        let backing = if needed == 0 {
            Backing::Owned(Vec::new())
        } else {
            // SAFETY: the map is read-only and owned by this storage. Concurrent
            // truncation by another process is outside what this layer supports.
            Backing::ReadOnly(unsafe { Mmap::map(&file)? })
        };
        log::debug!("Mapped {} read-only ({needed} bytes)", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            backing,
            offset,
            len,
        })
    }

    /// Create (or truncate) a file of exactly `len` zero bytes and map it read-write.
    #[allow(unsafe_code)]
    pub(crate) fn create(path: &Path, len: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len as u64)?;

        let backing = if len == 0 {
            Backing::Owned(Vec::new())
        } else {
            // SAFETY: the file was just created with the mapped length and
            // this storage is its only writer.
            Backing::Writable(unsafe { MmapMut::map_mut(&file)? })
        };
        log::debug!("Mapped {} read-write ({len} bytes)", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            backing,
            offset: 0,
            len,
        })
    }

    /// Copy the cube into an owned buffer re-encoded as `to` in host byte order.
    pub(crate) fn converted(self, from: ElementEncoding, order: ByteOrder, to: ElementEncoding) -> Result<Self> {
        log::warn!(
            "Converting {} from {from} to {to} in memory; the file is no longer memory mapped",
            self.path.display()
        );
        let data = convert_buffer(self.bytes()?, from, order, to);
        let len = data.len();
        Ok(Self {
            path: self.path.clone(),
            backing: Backing::Owned(data),
            offset: 0,
            len,
        })
    }

    /// Cube bytes.
    pub(crate) fn bytes(&self) -> Result<&[u8]> {
        let all: &[u8] = match &self.backing {
            Backing::ReadOnly(map) => map,
            Backing::Writable(map) => map,
            Backing::Owned(data) => data,
            Backing::Released => return Err(EnviError::Closed),
        };
        Ok(&all[self.offset..self.offset + self.len])
    }

    /// Mutable cube bytes; fails on read-only maps.
    pub(crate) fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        let all: &mut [u8] = match &mut self.backing {
            Backing::Writable(map) => map,
            Backing::Owned(data) => data,
            Backing::ReadOnly(_) => {
                return Err(EnviError::ReadOnly {
                    path: self.path.clone(),
                });
            }
            Backing::Released => return Err(EnviError::Closed),
        };
        Ok(&mut all[self.offset..self.offset + self.len])
    }

    /// Whether writes are accepted.
    pub(crate) fn is_writable(&self) -> bool {
        matches!(self.backing, Backing::Writable(_) | Backing::Owned(_))
    }

    /// Whether the bytes come straight from a file mapping.
    pub(crate) fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::ReadOnly(_) | Backing::Writable(_))
    }

    /// Whether `release` has run.
    pub(crate) fn is_released(&self) -> bool {
        matches!(self.backing, Backing::Released)
    }

    /// Push pending writes to the file, keeping the mapping.
    pub(crate) fn flush(&self) -> Result<()> {
        match &self.backing {
            Backing::Writable(map) => Ok(map.flush()?),
            Backing::Released => Err(EnviError::Closed),
            _ => Ok(()),
        }
    }

    /// Flush and drop the mapping. A second call does nothing.
    pub(crate) fn release(&mut self) -> Result<()> {
        if self.is_released() {
            return Ok(());
        }
        let result = self.flush();
        self.backing = Backing::Released;
        log::debug!("Released {}", self.path.display());
        result
    }
}

impl Drop for CubeStorage {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to flush {} on drop: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sizes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dat");
        let mut storage = CubeStorage::create(&path, 12).unwrap();
        storage.bytes_mut().unwrap()[3] = 9;
        storage.release().unwrap();
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 12);
        assert_eq!(data[3], 9);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dat");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();
        let mut storage = CubeStorage::open_read(&path, 1, 2).unwrap();
        assert_eq!(storage.bytes().unwrap(), &[2, 3]);
        assert!(matches!(storage.bytes_mut(), Err(EnviError::ReadOnly { .. })));
        assert!(storage.is_mapped());
    }

    #[test]
    fn test_short_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dat");
        std::fs::write(&path, [0u8; 3]).unwrap();
        assert!(matches!(
            CubeStorage::open_read(&path, 0, 4),
            Err(EnviError::GeometryMismatch(_))
        ));
    }

    #[test]
    fn test_overflowing_offset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dat");
        std::fs::write(&path, [0u8; 4]).unwrap();
        assert!(matches!(
            CubeStorage::open_read(&path, usize::MAX, 1),
            Err(EnviError::GeometryMismatch(_))
        ));
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CubeStorage::open_read(&dir.path().join("nope"), 0, 4),
            Err(EnviError::BinaryNotFound { .. })
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dat");
        let mut storage = CubeStorage::create(&path, 4).unwrap();
        storage.release().unwrap();
        storage.release().unwrap();
        assert!(matches!(storage.bytes(), Err(EnviError::Closed)));
    }
}
