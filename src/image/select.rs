//! Index expressions for one cube axis.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

use crate::error::{EnviError, Result};

/// Selection along one axis.
///
/// Ranges are clamped to the axis length the way slices are; single indices
/// and lists must be in bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sel {
    /// A single index
    Index(usize),
    /// `start..end` in steps of `step`; `end == None` runs to the end
    Range {
        /// First index
        start: usize,
        /// One past the last index
        end: Option<usize>,
        /// Step, at least 1
        step: usize,
    },
    /// The whole axis
    All,
    /// Explicit indices, in order
    List(Vec<usize>),
    /// Spectrum names (spectral libraries, line axis only)
    Names(Vec<String>),
}

impl Sel {
    /// Strided range.
    pub fn step(start: usize, end: Option<usize>, step: usize) -> Self {
        Self::Range {
            start,
            end,
            step: step.max(1),
        }
    }

    /// Whether the selection names exactly one position.
    pub fn is_scalar(&self) -> bool {
        match self {
            Self::Index(_) => true,
            Self::Names(names) => names.len() == 1,
            _ => false,
        }
    }

    /// Resolve to concrete indices on an axis of length `len`.
    pub(crate) fn resolve(&self, len: usize, axis: &'static str) -> Result<Vec<usize>> {
        let check = |index: usize| {
            if index < len {
                Ok(index)
            } else {
                Err(EnviError::OutOfBounds { axis, index, len })
            }
        };
        match self {
            Self::Index(i) => Ok(vec![check(*i)?]),
            Self::Range { start, end, step } => {
                let end = end.unwrap_or(len).min(len);
                Ok((*start..end).step_by((*step).max(1)).collect())
            }
            Self::All => Ok((0..len).collect()),
            Self::List(indices) => indices.iter().map(|&i| check(i)).collect(),
            Self::Names(names) => Err(EnviError::Lookup(format!(
                "spectrum names {names:?} used on the {axis} axis"
            ))),
        }
    }
}

impl From<usize> for Sel {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<Range<usize>> for Sel {
    fn from(range: Range<usize>) -> Self {
        Self::step(range.start, Some(range.end), 1)
    }
}

impl From<RangeInclusive<usize>> for Sel {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::step(*range.start(), Some(range.end().saturating_add(1)), 1)
    }
}

impl From<RangeFrom<usize>> for Sel {
    fn from(range: RangeFrom<usize>) -> Self {
        Self::step(range.start, None, 1)
    }
}

impl From<RangeTo<usize>> for Sel {
    fn from(range: RangeTo<usize>) -> Self {
        Self::step(0, Some(range.end), 1)
    }
}

impl From<RangeFull> for Sel {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}

impl From<Vec<usize>> for Sel {
    fn from(indices: Vec<usize>) -> Self {
        Self::List(indices)
    }
}

impl From<&[usize]> for Sel {
    fn from(indices: &[usize]) -> Self {
        Self::List(indices.to_vec())
    }
}

impl From<&str> for Sel {
    fn from(name: &str) -> Self {
        Self::Names(vec![name.to_string()])
    }
}

impl From<Vec<&str>> for Sel {
    fn from(names: Vec<&str>) -> Self {
        Self::Names(names.into_iter().map(str::to_string).collect())
    }
}
