//! Uniform `(line, sample, band)` view over a binary cube.
//!
//! Whatever the physical interleave, an [`EnviImage`] is indexed with the
//! same coordinates. Band positions are *visible* positions: they go through
//! the header's virtual band index before touching the file.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::error::{EnviError, Result};
use crate::header::{ByteOrder, ElementEncoding, EnviHeader, VirtualBandIndex};
use crate::image::distance::DistanceMeasure;
use crate::image::element::{Element, read_as, write_as};
use crate::image::layout::Layout;
use crate::image::select::Sel;
use crate::image::storage::CubeStorage;

/// What kind of ENVI file an image was opened as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Ordinary image cube
    Standard,
    /// Single-band class map
    Classification,
    /// Collection of named spectra
    SpectralLibrary,
}

/// An opened or newly created ENVI image.
pub struct EnviImage {
    path: PathBuf,
    header: EnviHeader,
    kind: ImageKind,
    layout: Layout,
    band_index: VirtualBandIndex,
    encoding: ElementEncoding,
    file_order: ByteOrder,
    storage_order: ByteOrder,
    strides: [usize; 3],
    storage: CubeStorage,
    wavelength_lookup: RefCell<HashMap<u64, usize>>,
}

impl std::fmt::Debug for EnviImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnviImage")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("layout", &self.layout)
            .field("shape", &self.shape())
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl EnviImage {
    /// Bind a header to its storage. `storage_order` is the byte order of
    /// the bytes actually held by `storage`.
    pub(crate) fn from_parts(
        path: PathBuf,
        header: EnviHeader,
        kind: ImageKind,
        layout: Layout,
        storage: CubeStorage,
        storage_order: ByteOrder,
    ) -> Result<Self> {
        let encoding = header.data_type()?;
        let band_index = header.band_index();
        if band_index.physical_bands() != header.physical_bands() {
            return Err(EnviError::GeometryMismatch(format!(
                "virtual band index built for {} bands, image has {}",
                band_index.physical_bands(),
                header.physical_bands()
            )));
        }
        let strides = layout.strides(header.lines(), header.samples(), header.physical_bands());
        Ok(Self {
            path,
            file_order: header.byte_order(),
            header,
            kind,
            layout,
            band_index,
            encoding,
            storage_order,
            strides,
            storage,
            wavelength_lookup: RefCell::new(HashMap::new()),
        })
    }

    /// Path of the binary cube.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header the image was opened or created with.
    pub fn header(&self) -> &EnviHeader {
        &self.header
    }

    /// File kind.
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Physical layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Element encoding of the (possibly converted) cube.
    pub fn encoding(&self) -> ElementEncoding {
        self.encoding
    }

    /// Byte order declared for the file on disk.
    pub fn file_byte_order(&self) -> ByteOrder {
        self.file_order
    }

    /// Byte order of every value handed out: always the host order.
    pub fn effective_byte_order(&self) -> ByteOrder {
        ByteOrder::host()
    }

    /// Whether values are being byte-swapped on access.
    pub fn is_swapped(&self) -> bool {
        self.storage_order != ByteOrder::host()
    }

    /// Number of lines (spectra for a spectral library).
    pub fn lines(&self) -> usize {
        self.header.lines()
    }

    /// Number of samples (1 for a spectral library).
    pub fn samples(&self) -> usize {
        self.header.samples()
    }

    /// Number of visible bands.
    pub fn bands(&self) -> usize {
        self.band_index.len()
    }

    /// Logical shape `(lines, samples, bands)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.lines(), self.samples(), self.bands())
    }

    /// Visible-to-physical band mapping.
    pub fn band_index(&self) -> &VirtualBandIndex {
        &self.band_index
    }

    /// Wavelengths of the visible bands.
    pub fn wavelength(&self) -> Option<Vec<f64>> {
        self.header.wavelength()
    }

    /// Names of the visible bands.
    pub fn band_names(&self) -> Option<Vec<String>> {
        self.header.band_names()
    }

    /// Band widths of the visible bands.
    pub fn fwhm(&self) -> Option<Vec<f64>> {
        self.header.fwhm()
    }

    /// Bad band list of the visible bands.
    pub fn bbl(&self) -> Option<Vec<i64>> {
        self.header.bbl()
    }

    /// Whether writes are accepted.
    pub fn is_writable(&self) -> bool {
        self.storage.is_writable()
    }

    /// Whether values come straight from a memory map.
    pub fn is_mapped(&self) -> bool {
        self.storage.is_mapped()
    }

    /// Whether [`EnviImage::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.storage.is_released()
    }

    fn resolve_lines(&self, sel: &Sel) -> Result<Vec<usize>> {
        match sel {
            Sel::Names(names) => names.iter().map(|n| self.spectrum_index(n)).collect(),
            other => other.resolve(self.lines(), "line"),
        }
    }

    fn resolve_samples(&self, sel: &Sel) -> Result<Vec<usize>> {
        sel.resolve(self.samples(), "sample")
    }

    /// Visible band selection to physical band positions. A single-band
    /// image ignores the selection unless its only band is hidden.
    fn resolve_bands(&self, sel: &Sel) -> Result<Vec<usize>> {
        if self.layout.is_single_band() && !self.band_index.is_empty() {
            return Ok(vec![0]);
        }
        sel.resolve(self.band_index.len(), "band")?
            .into_iter()
            .map(|v| self.band_index.physical(v))
            .collect()
    }

    fn resolve(&self, lines: &Sel, samples: &Sel, bands: &Sel) -> Result<[Vec<usize>; 3]> {
        Ok([
            self.resolve_lines(lines)?,
            self.resolve_samples(samples)?,
            self.resolve_bands(bands)?,
        ])
    }

    fn gather<T: Element>(&self, [ys, xs, bs]: &[Vec<usize>; 3]) -> Result<Array3<T>> {
        let bytes = self.storage.bytes()?;
        let size = self.encoding.size();
        let [ls, ss, bst] = self.strides;
        let mut values = Vec::with_capacity(ys.len() * xs.len() * bs.len());
        for &y in ys {
            for &x in xs {
                for &b in bs {
                    let start = (y * ls + x * ss + b * bst) * size;
                    values.push(read_as::<T>(
                        &bytes[start..start + size],
                        self.encoding,
                        self.storage_order,
                    ));
                }
            }
        }
        Array3::from_shape_vec((ys.len(), xs.len(), bs.len()), values)
            .map_err(|e| EnviError::GeometryMismatch(e.to_string()))
    }

    fn scatter<T, F>(&mut self, [ys, xs, bs]: &[Vec<usize>; 3], value: F) -> Result<()>
    where
        T: Element,
        F: Fn(usize, usize, usize) -> T,
    {
        let size = self.encoding.size();
        let encoding = self.encoding;
        let order = self.storage_order;
        let [ls, ss, bst] = self.strides;
        let bytes = self.storage.bytes_mut()?;
        for (i, &y) in ys.iter().enumerate() {
            for (j, &x) in xs.iter().enumerate() {
                for (k, &b) in bs.iter().enumerate() {
                    let start = (y * ls + x * ss + b * bst) * size;
                    write_as(value(i, j, k), &mut bytes[start..start + size], encoding, order);
                }
            }
        }
        Ok(())
    }

    /// Three-index read: any of the axes may be a single index, range, list
    /// or (for spectral libraries, on the line axis) spectrum names.
    /// Always returns a `(lines, samples, bands)` array.
    pub fn select<T: Element>(
        &self,
        lines: impl Into<Sel>,
        samples: impl Into<Sel>,
        bands: impl Into<Sel>,
    ) -> Result<Array3<T>> {
        let indices = self.resolve(&lines.into(), &samples.into(), &bands.into())?;
        self.gather(&indices)
    }

    /// Single value at `(line, sample, band)`.
    pub fn value_at<T: Element>(&self, line: usize, sample: usize, band: usize) -> Result<T> {
        let cell = self.select::<T>(line, sample, band)?;
        Ok(cell[[0, 0, 0]])
    }

    /// Every visible band at one spatial position, in visible order.
    pub fn spectrum_at<T: Element>(&self, line: usize, sample: usize) -> Result<Array1<T>> {
        let cube = self.select::<T>(line, sample, Sel::All)?;
        Ok(cube.index_axis_move(Axis(0), 0).index_axis_move(Axis(0), 0))
    }

    /// One visible band as a `(lines, samples)` slab.
    pub fn band<T: Element>(&self, band: usize) -> Result<Array2<T>> {
        let cube = self.select::<T>(Sel::All, Sel::All, band)?;
        Ok(cube.index_axis_move(Axis(2), 0))
    }

    /// Several visible bands as a `(lines, samples, bands)` slab.
    pub fn bands_slab<T: Element>(&self, bands: impl Into<Sel>) -> Result<Array3<T>> {
        self.select(Sel::All, Sel::All, bands)
    }

    /// The whole visible cube.
    pub fn cube<T: Element>(&self) -> Result<Array3<T>> {
        self.select(Sel::All, Sel::All, Sel::All)
    }

    /// Three-index write; `values` must match the addressed shape.
    pub fn assign<T: Element>(
        &mut self,
        lines: impl Into<Sel>,
        samples: impl Into<Sel>,
        bands: impl Into<Sel>,
        values: ArrayView3<'_, T>,
    ) -> Result<()> {
        let indices = self.resolve(&lines.into(), &samples.into(), &bands.into())?;
        let expected = [indices[0].len(), indices[1].len(), indices[2].len()];
        if values.shape() != expected {
            return Err(EnviError::shape_mismatch(&expected, values.shape()));
        }
        self.scatter(&indices, |i, j, k| values[[i, j, k]])
    }

    /// Write a single value.
    pub fn set_value<T: Element>(&mut self, line: usize, sample: usize, band: usize, value: T) -> Result<()> {
        let indices = self.resolve(&line.into(), &sample.into(), &band.into())?;
        self.scatter(&indices, |_, _, _| value)
    }

    /// Write every visible band at one spatial position.
    pub fn set_spectrum<T: Element>(&mut self, line: usize, sample: usize, values: &[T]) -> Result<()> {
        let view = ArrayView1::from(values).insert_axis(Axis(0)).insert_axis(Axis(0));
        self.assign(line, sample, Sel::All, view)
    }

    /// Write one visible band from a `(lines, samples)` slab.
    pub fn set_band<T: Element>(&mut self, band: usize, values: ArrayView2<'_, T>) -> Result<()> {
        self.assign(Sel::All, Sel::All, band, values.insert_axis(Axis(2)))
    }

    /// Set every visible element to `value`.
    pub fn fill<T: Element>(&mut self, value: T) -> Result<()> {
        let indices = self.resolve(&Sel::All, &Sel::All, &Sel::All)?;
        self.scatter(&indices, |_, _, _| value)
    }

    /// Spectrum as `f64`, for numeric helpers.
    pub fn spectrum_f64(&self, line: usize, sample: usize) -> Result<Array1<f64>> {
        if self.encoding.is_complex() {
            return Err(EnviError::ComplexData("spectrum_f64"));
        }
        self.spectrum_at(line, sample)
    }

    /// Distance between the spectra at two `(line, sample)` positions.
    pub fn distance(
        &self,
        measure: DistanceMeasure,
        a: (usize, usize),
        b: (usize, usize),
        nan_tolerant: bool,
    ) -> Result<f64> {
        let sa = self.spectrum_f64(a.0, a.1)?;
        let sb = self.spectrum_f64(b.0, b.1)?;
        let (sa, sb) = (sa.to_vec(), sb.to_vec());
        if nan_tolerant {
            measure.apply_nan(&sa, &sb)
        } else {
            measure.apply(&sa, &sb)
        }
    }

    /// Visible band whose wavelength is closest to `wavelength`; ties go to
    /// the lowest index.
    pub fn wavelength_to_band_index(&self, wavelength: f64) -> Result<usize> {
        let key = wavelength.to_bits();
        if let Some(&index) = self.wavelength_lookup.borrow().get(&key) {
            return Ok(index);
        }
        if wavelength.is_nan() {
            return Err(EnviError::Lookup("wavelength NaN".to_string()));
        }
        let wavelengths = self
            .wavelength()
            .ok_or_else(|| EnviError::Lookup(format!("no wavelengths to match {wavelength}")))?;

        let mut best: Option<(usize, f64)> = None;
        for (i, w) in wavelengths.iter().enumerate() {
            let distance = (w - wavelength).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        let (index, _) = best
            .ok_or_else(|| EnviError::Lookup(format!("no visible bands to match {wavelength}")))?;
        self.wavelength_lookup.borrow_mut().insert(key, index);
        Ok(index)
    }

    /// Spectrum names of a spectral library.
    pub fn spectra_names(&self) -> Option<Vec<String>> {
        self.header.spectra_names()
    }

    /// Line index of the spectrum called `name`.
    pub fn spectrum_index(&self, name: &str) -> Result<usize> {
        if self.kind != ImageKind::SpectralLibrary {
            return Err(EnviError::Lookup(format!(
                "'{name}': spectrum names need a spectral library"
            )));
        }
        self.spectra_names()
            .and_then(|names| names.iter().position(|n| n == name))
            .ok_or_else(|| EnviError::SpectrumNotFound(name.to_string()))
    }

    /// Spectrum of a spectral library looked up by name.
    pub fn spectrum_named<T: Element>(&self, name: &str) -> Result<Array1<T>> {
        let line = self.spectrum_index(name)?;
        self.spectrum_at(line, 0)
    }

    /// Class names of a classification image.
    pub fn class_names(&self) -> Option<Vec<String>> {
        self.header.class_names()
    }

    /// Class colours of a classification image.
    pub fn class_lookup(&self) -> Option<Vec<[u8; 3]>> {
        self.header.class_lookup()
    }

    /// Name of the class stored at `(line, sample)`.
    pub fn class_name_at(&self, line: usize, sample: usize) -> Result<String> {
        let class = self.value_at::<i64>(line, sample, 0)?;
        let names = self
            .class_names()
            .ok_or_else(|| EnviError::Lookup("image has no class names".to_string()))?;
        usize::try_from(class)
            .ok()
            .and_then(|c| names.get(c).cloned())
            .ok_or_else(|| EnviError::Lookup(format!("class value {class} has no name")))
    }

    /// Push pending writes to the file without closing.
    pub fn flush(&self) -> Result<()> {
        self.storage.flush()
    }

    /// Flush and release the mapping. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        self.storage.release()
    }
}
