//! ENVI header model: ordered attribute set with typed accessors.
//!
//! Attributes keep their file order. Well-known keys get typed accessors;
//! any other key round-trips untouched. For spectral libraries the on-disk
//! `samples` attribute holds the number of values per spectrum, so the
//! logical accessors ([`EnviHeader::bands`], [`EnviHeader::samples`]) swap
//! the two roles.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{EnviError, Result};
use crate::header::encoding::{ByteOrder, ElementEncoding, FileType, Interleave};
use crate::header::text::{self, ENVI_MAGIC, ParsedHeader, normalize_key};
use crate::header::value::HeaderValue;
use crate::header::virtual_bands::{BandOptions, VirtualBandIndex};

/// List-valued attributes that are never per-band, whatever their length.
const NON_BAND_LISTS: &[&str] = &[
    "description",
    "map_info",
    "projection_info",
    "geo_points",
    "coordinate_system_string",
    "pixel_size",
    "class_names",
    "class_lookup",
    "spectra_names",
    "default_bands",
];

/// Attribute overrides applied on top of a parsed or cloned header.
///
/// `None` removes the attribute, so a key inherited from a cloned header can
/// be dropped before a new file is written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderOverrides {
    entries: Vec<(String, Option<HeaderValue>)>,
}

impl HeaderOverrides {
    /// Create an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn set(mut self, key: &str, value: impl Into<HeaderValue>) -> Self {
        self.entries.push((normalize_key(key), Some(value.into())));
        self
    }

    /// Remove `key`.
    pub fn unset(mut self, key: &str) -> Self {
        self.entries.push((normalize_key(key), None));
        self
    }

    /// Whether no overrides were given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overrides in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&HeaderValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// Parsed ENVI header.
#[derive(Debug, Clone, PartialEq)]
pub struct EnviHeader {
    magic: String,
    attributes: IndexMap<String, HeaderValue>,
    data_type: Option<ElementEncoding>,
    virtual_bands: Option<VirtualBandIndex>,
}

impl EnviHeader {
    fn empty() -> Self {
        Self {
            magic: ENVI_MAGIC.to_string(),
            attributes: IndexMap::new(),
            data_type: None,
            virtual_bands: None,
        }
    }

    /// Build a header.
    ///
    /// Steps, later ones winning: parse `source`; copy every attribute of
    /// `clone_from` with its virtual band view baked in; apply a `file_type`
    /// override; apply the remaining overrides in order; compute the virtual
    /// band index if `source` was given and `options` ask for one.
    pub fn construct(
        source: Option<&Path>,
        clone_from: Option<&EnviHeader>,
        options: BandOptions,
        overrides: &HeaderOverrides,
    ) -> Result<Self> {
        let mut header = match source {
            Some(path) => Self::from_parsed(text::parse(&read_header_text(path)?)?)?,
            None => Self::empty(),
        };

        if let Some(parent) = clone_from {
            header.magic.clone_from(&parent.magic);
            for (key, value) in parent.baked_attributes() {
                header.store(key, value)?;
            }
        }

        let (file_type, rest): (Vec<_>, Vec<_>) =
            overrides.iter().partition(|(key, _)| *key == "file_type");
        for (key, value) in file_type.into_iter().chain(rest) {
            header.apply_override(key, value.cloned())?;
        }

        header.validate_geometry()?;
        if source.is_some() {
            header.virtualize(options)?;
        }
        Ok(header)
    }

    /// Read a header file.
    pub fn read(path: &Path, options: BandOptions) -> Result<Self> {
        Self::construct(Some(path), None, options, &HeaderOverrides::new())
    }

    /// Parse header text, as if read from a file.
    pub fn parse(raw: &str, options: BandOptions) -> Result<Self> {
        let mut header = Self::from_parsed(text::parse(raw)?)?;
        header.validate_geometry()?;
        header.virtualize(options)?;
        Ok(header)
    }

    /// Clone `parent` with its virtual view baked in and `overrides` applied.
    pub fn derive(parent: &EnviHeader, overrides: &HeaderOverrides) -> Result<Self> {
        Self::construct(None, Some(parent), BandOptions::default(), overrides)
    }

    fn from_parsed(parsed: ParsedHeader) -> Result<Self> {
        let mut header = Self::empty();
        header.magic = parsed.magic;
        for (key, value) in parsed.attributes {
            header.store(key, value)?;
        }
        if !header.attributes.contains_key("byte_order") {
            let host = ByteOrder::host();
            log::warn!("Header has no byte order, assuming host order ({host:?})");
            header
                .attributes
                .insert("byte_order".to_string(), HeaderValue::Int(host.code()));
        }
        Ok(header)
    }

    /// Insert without role redirection; validates typed keys.
    fn store(&mut self, key: String, value: HeaderValue) -> Result<()> {
        match key.as_str() {
            "data_type" => {
                let encoding = match &value {
                    HeaderValue::Str(name) if name.trim().parse::<i64>().is_err() => {
                        name.parse::<ElementEncoding>()?
                    }
                    other => {
                        let code = other.as_int().ok_or_else(|| {
                            EnviError::invalid_attribute("data_type", format!("'{other}'"))
                        })?;
                        ElementEncoding::from_envi_code(code)?
                    }
                };
                self.data_type = Some(encoding);
                self.attributes
                    .insert(key, HeaderValue::Int(encoding.envi_code()));
            }
            "byte_order" => {
                let code = value.as_int().ok_or_else(|| {
                    EnviError::invalid_attribute("byte_order", format!("'{value}'"))
                })?;
                ByteOrder::from_code(code)?;
                self.attributes.insert(key, HeaderValue::Int(code));
            }
            _ => {
                self.attributes.insert(key, value);
            }
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Option<HeaderValue> {
        if key == "data_type" {
            self.data_type = None;
        }
        self.attributes.shift_remove(key)
    }

    fn apply_override(&mut self, key: &str, value: Option<HeaderValue>) -> Result<()> {
        let speclib = self.is_speclib();
        let slot = match key {
            "bands" if speclib => "samples",
            "samples" if speclib => {
                if let Some(v) = &value
                    && v.as_int() != Some(1)
                {
                    return Err(EnviError::SpeclibBands(v.as_int().unwrap_or(-1)));
                }
                "bands"
            }
            other => other,
        };
        match value {
            Some(value) => self.store(slot.to_string(), value),
            None => {
                self.remove(slot);
                Ok(())
            }
        }
    }

    fn validate_geometry(&self) -> Result<()> {
        for key in ["lines", "samples", "bands"] {
            let value = self
                .attributes
                .get(key)
                .ok_or_else(|| EnviError::MissingAttribute(key.to_string()))?;
            match value.as_int() {
                Some(n) if n >= 0 => {}
                _ => {
                    return Err(EnviError::invalid_attribute(
                        key,
                        format!("expected a non-negative integer, got '{value}'"),
                    ));
                }
            }
        }
        if self.is_speclib() {
            let bands = self.raw_count("bands");
            if bands != 1 {
                return Err(EnviError::SpeclibBands(bands as i64));
            }
        }
        Ok(())
    }

    fn virtualize(&mut self, options: BandOptions) -> Result<()> {
        if !options.is_virtual() {
            return Ok(());
        }
        let physical = self.physical_bands();
        let wavelengths = self.numeric_list("wavelength")?;
        let bbl = match self.attributes.get("bbl") {
            Some(value) => Some(value.to_int_vec().ok_or_else(|| {
                EnviError::invalid_attribute("bbl", "expected a list of 0/1 flags")
            })?),
            None => None,
        };
        let index = VirtualBandIndex::build(physical, wavelengths.as_deref(), bbl.as_deref(), options)?;
        log::debug!(
            "Virtual band index: {} of {} bands visible",
            index.len(),
            index.physical_bands()
        );
        self.virtual_bands = Some(index);
        Ok(())
    }

    fn numeric_list(&self, key: &str) -> Result<Option<Vec<f64>>> {
        match self.attributes.get(key) {
            Some(value) => value
                .to_float_vec()
                .map(Some)
                .ok_or_else(|| EnviError::invalid_attribute(key, "expected a numeric list")),
            None => Ok(None),
        }
    }

    /// Attribute key that carries the physical band count.
    fn band_slot(&self) -> &'static str {
        if self.is_speclib() { "samples" } else { "bands" }
    }

    fn raw_count(&self, key: &str) -> usize {
        self.attributes
            .get(key)
            .and_then(HeaderValue::as_int)
            .map_or(0, |n| n.max(0) as usize)
    }

    fn is_per_band(&self, key: &str, value: &HeaderValue) -> bool {
        !NON_BAND_LISTS.contains(&key) && value.list_len() == Some(self.physical_bands())
    }

    /// Attributes with the virtual band view applied: per-band lists
    /// reordered/filtered and the band count set to the visible count.
    pub fn baked_attributes(&self) -> IndexMap<String, HeaderValue> {
        let mut out = self.attributes.clone();
        if let Some(index) = &self.virtual_bands {
            for (key, value) in out.iter_mut() {
                if self.is_per_band(key, value)
                    && let HeaderValue::List(items) = value
                {
                    *items = index.project(items);
                }
            }
            out.insert(self.band_slot().to_string(), HeaderValue::from(index.len()));
        }
        out
    }

    /// Serialized header text.
    pub fn to_text(&self) -> String {
        let baked = self.baked_attributes();
        text::serialize(&self.magic, baked.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Write the header and sync it to disk before returning.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_text().as_bytes())?;
        file.sync_all()?;
        log::debug!("Wrote header {}", path.display());
        Ok(())
    }

    /// Set an attribute with the same rules as a construction override.
    pub fn set(&mut self, key: &str, value: impl Into<HeaderValue>) -> Result<()> {
        if self.virtual_bands.is_some() {
            return Err(EnviError::GeometryFrozen);
        }
        self.apply_override(&normalize_key(key), Some(value.into()))?;
        self.validate_geometry()
    }

    /// Remove an attribute so it is not written.
    pub fn unset(&mut self, key: &str) -> Result<Option<HeaderValue>> {
        if self.virtual_bands.is_some() {
            return Err(EnviError::GeometryFrozen);
        }
        let key = normalize_key(key);
        if matches!(key.as_str(), "lines" | "samples" | "bands") {
            return Err(EnviError::invalid_attribute(key, "geometry attributes cannot be removed"));
        }
        Ok(self.remove(&key))
    }

    /// Set the number of lines.
    pub fn set_lines(&mut self, lines: usize) -> Result<()> {
        self.set("lines", lines)
    }

    /// Set the logical number of samples (must be 1 for a spectral library).
    pub fn set_samples(&mut self, samples: usize) -> Result<()> {
        self.set("samples", samples)
    }

    /// Set the logical number of bands.
    pub fn set_bands(&mut self, bands: usize) -> Result<()> {
        self.set("bands", bands)
    }

    /// Consume the binary header offset so a later write does not repeat it.
    pub(crate) fn take_header_offset(&mut self) -> usize {
        let offset = self.header_offset();
        if offset != 0 {
            self.attributes
                .insert("header_offset".to_string(), HeaderValue::Int(0));
        }
        offset
    }

    /// Force attributes describing a freshly written host-order cube.
    pub(crate) fn prepare_for_new_file(&mut self) {
        self.attributes.shift_remove("header_offset");
        self.attributes.insert(
            "byte_order".to_string(),
            HeaderValue::Int(ByteOrder::host().code()),
        );
    }

    /// Record an in-memory conversion of the cube to `encoding`.
    pub(crate) fn set_encoding(&mut self, encoding: ElementEncoding) {
        self.data_type = Some(encoding);
        self.attributes
            .insert("data_type".to_string(), HeaderValue::Int(encoding.envi_code()));
    }

    /// First-line magic token.
    pub fn magic(&self) -> &str {
        &self.magic
    }

    /// Raw attribute value (not projected through the virtual band index).
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.attributes.get(&normalize_key(key))
    }

    /// Raw attributes in order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether an attribute is present.
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(&normalize_key(key))
    }

    /// Per-band attribute in visible band order.
    pub fn per_band(&self, key: &str) -> Option<HeaderValue> {
        let key = normalize_key(key);
        let value = self.attributes.get(&key)?;
        match (&self.virtual_bands, value) {
            (Some(index), HeaderValue::List(items)) if self.is_per_band(&key, value) => {
                Some(HeaderValue::List(index.project(items)))
            }
            _ => Some(value.clone()),
        }
    }

    /// The virtual band index, if wavelength sorting or the bad band list was applied.
    pub fn virtual_bands(&self) -> Option<&VirtualBandIndex> {
        self.virtual_bands.as_ref()
    }

    /// Virtual band index, identity when none was requested.
    pub fn band_index(&self) -> VirtualBandIndex {
        self.virtual_bands
            .clone()
            .unwrap_or_else(|| VirtualBandIndex::identity(self.physical_bands()))
    }

    /// Number of lines.
    pub fn lines(&self) -> usize {
        self.raw_count("lines")
    }

    /// Logical number of samples (1 for a spectral library).
    pub fn samples(&self) -> usize {
        if self.is_speclib() {
            self.raw_count("bands")
        } else {
            self.raw_count("samples")
        }
    }

    /// Logical number of visible bands (values per spectrum for a spectral library).
    pub fn bands(&self) -> usize {
        self.virtual_bands
            .as_ref()
            .map_or_else(|| self.physical_bands(), VirtualBandIndex::len)
    }

    /// Number of bands stored in the binary file.
    pub fn physical_bands(&self) -> usize {
        self.raw_count(self.band_slot())
    }

    /// Element encoding of the binary cube.
    pub fn data_type(&self) -> Result<ElementEncoding> {
        self.data_type
            .ok_or_else(|| EnviError::MissingAttribute("data_type".to_string()))
    }

    /// Declared byte order of the binary cube.
    pub fn byte_order(&self) -> ByteOrder {
        self.attributes
            .get("byte_order")
            .and_then(HeaderValue::as_int)
            .and_then(|code| ByteOrder::from_code(code).ok())
            .unwrap_or_else(ByteOrder::host)
    }

    /// Declared interleave.
    pub fn interleave(&self) -> Result<Interleave> {
        let value = self
            .attributes
            .get("interleave")
            .ok_or_else(|| EnviError::MissingAttribute("interleave".to_string()))?;
        value.to_string().parse()
    }

    /// Raw `file type` text.
    pub fn file_type_str(&self) -> Option<String> {
        self.attributes.get("file_type").map(HeaderValue::to_string)
    }

    /// Parsed `file type`; `None` when absent.
    pub fn file_type(&self) -> Result<Option<FileType>> {
        self.file_type_str().map(|s| s.parse()).transpose()
    }

    /// Whether this header describes a spectral library.
    pub fn is_speclib(&self) -> bool {
        matches!(self.file_type(), Ok(Some(FileType::SpectralLibrary)))
    }

    /// Byte offset of the cube inside the binary file.
    pub fn header_offset(&self) -> usize {
        self.raw_count("header_offset")
    }

    /// Band centre wavelengths in visible order.
    pub fn wavelength(&self) -> Option<Vec<f64>> {
        self.per_band("wavelength")?.to_float_vec()
    }

    /// Band widths in visible order.
    pub fn fwhm(&self) -> Option<Vec<f64>> {
        self.per_band("fwhm")?.to_float_vec()
    }

    /// Bad band list in visible order.
    pub fn bbl(&self) -> Option<Vec<i64>> {
        self.per_band("bbl")?.to_int_vec()
    }

    /// Band names in visible order.
    pub fn band_names(&self) -> Option<Vec<String>> {
        self.per_band("band_names")?.to_string_vec()
    }

    /// Per-band gains in visible order.
    pub fn data_gain_values(&self) -> Option<Vec<f64>> {
        self.per_band("data_gain_values")?.to_float_vec()
    }

    /// Value marking missing data.
    pub fn data_ignore_value(&self) -> Option<f64> {
        self.attributes.get("data_ignore_value")?.as_float()
    }

    /// Wavelength unit name.
    pub fn wavelength_units(&self) -> Option<String> {
        self.attributes.get("wavelength_units").map(HeaderValue::to_string)
    }

    /// Free-text description; list items are re-joined.
    pub fn description(&self) -> Option<String> {
        match self.attributes.get("description")? {
            HeaderValue::List(items) => Some(
                items
                    .iter()
                    .map(HeaderValue::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => Some(other.to_string()),
        }
    }

    /// Raw `map info` list.
    pub fn map_info(&self) -> Option<&HeaderValue> {
        self.attributes.get("map_info")
    }

    /// 1-based default display bands.
    pub fn default_bands(&self) -> Option<Vec<usize>> {
        self.attributes
            .get("default_bands")?
            .to_int_vec()
            .map(|v| v.into_iter().map(|b| b.max(0) as usize).collect())
    }

    /// Spectrum names of a spectral library.
    pub fn spectra_names(&self) -> Option<Vec<String>> {
        self.attributes.get("spectra_names")?.to_string_vec()
    }

    /// Number of classes of a classification image.
    pub fn classes(&self) -> Option<usize> {
        self.attributes
            .get("classes")?
            .as_int()
            .map(|n| n.max(0) as usize)
    }

    /// Class names of a classification image.
    pub fn class_names(&self) -> Option<Vec<String>> {
        self.attributes.get("class_names")?.to_string_vec()
    }

    /// Class colours as RGB triples.
    pub fn class_lookup(&self) -> Option<Vec<[u8; 3]>> {
        let flat = self.attributes.get("class_lookup")?.to_int_vec()?;
        if flat.len() % 3 != 0 {
            return None;
        }
        Some(
            flat.chunks_exact(3)
                .map(|c| [c[0].clamp(0, 255) as u8, c[1].clamp(0, 255) as u8, c[2].clamp(0, 255) as u8])
                .collect(),
        )
    }
}

impl fmt::Display for EnviHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn read_header_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EnviError::HeaderNotFound {
            image: path.to_path_buf(),
            tried: vec![path.to_path_buf()],
        },
        _ => EnviError::Io(e),
    })
}
