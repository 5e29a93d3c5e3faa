//! Conformance (size) context
//!
//! A conformant structure transmits the dimensions of its conformant arrays
//! ahead of the structure itself. The outermost conformant value of a call
//! tree computes its dimension list once, writes it, and parks it in the
//! per-call state; nested fields then look the dimensions up instead of
//! deriving and writing them again. The state is owned by one
//! [`NdrWriter`](crate::NdrWriter) / [`NdrReader`](crate::NdrReader) and
//! never outlives it.

use crate::{NdrError, Result};
use std::collections::HashMap;

/// Values that carry attacker-controlled array dimensions
pub trait NdrSizeInfo {
    /// Number of dimensions returned by [`ndr_size_info`](Self::ndr_size_info)
    const DIMENSIONS: usize = 1;

    /// Array dimensions, outermost first
    fn ndr_size_info(&self) -> Vec<u64>;
}

/// Dimension to transmit for a count field with a known collection length
///
/// A zero count is a placeholder: the natural length of the content wins.
#[inline]
pub fn size_from_content(declared: u64, natural: usize) -> u64 {
    if declared == 0 {
        natural as u64
    } else {
        declared
    }
}

/// Size context of an in-flight encode
///
/// Besides the dimensions in scope, it remembers how many elements each
/// conformant array sent in the inline pass of the value being written,
/// keyed by the array's address. The deferred pass of that value runs
/// after the size scope has closed and must send referents for exactly
/// those elements.
#[derive(Debug, Default)]
pub struct EncodeState {
    size_info: Option<Vec<u64>>,
    transmitted: Vec<HashMap<usize, usize>>,
}

impl EncodeState {
    /// Dimensions in scope, if a conformant value is being written
    pub fn size_info(&self) -> Option<&[u64]> {
        self.size_info.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.size_info.is_some()
    }

    pub(crate) fn enter(&mut self, sizes: Vec<u64>) {
        self.size_info = Some(sizes);
    }

    pub(crate) fn leave(&mut self) {
        self.size_info = None;
    }

    pub(crate) fn dim(&self, dimension: usize) -> Result<u64> {
        self.size_info
            .as_ref()
            .and_then(|sizes| sizes.get(dimension).copied())
            .ok_or(NdrError::MissingSizeInfo { dimension })
    }

    pub(crate) fn push_value(&mut self) {
        self.transmitted.push(HashMap::new());
    }

    pub(crate) fn pop_value(&mut self) {
        self.transmitted.pop();
    }

    pub(crate) fn record_transmitted(&mut self, array: usize, count: usize) {
        if let Some(counts) = self.transmitted.last_mut() {
            counts.insert(array, count);
        }
    }

    pub(crate) fn take_transmitted(&mut self, array: usize) -> Option<usize> {
        self.transmitted.last_mut().and_then(|counts| counts.remove(&array))
    }
}

/// Size context of an in-flight decode
#[derive(Debug, Default)]
pub struct DecodeState {
    size_info: Option<Vec<u64>>,
}

impl DecodeState {
    pub fn size_info(&self) -> Option<&[u64]> {
        self.size_info.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.size_info.is_some()
    }

    pub(crate) fn enter(&mut self, sizes: Vec<u64>) {
        self.size_info = Some(sizes);
    }

    pub(crate) fn leave(&mut self) {
        self.size_info = None;
    }

    pub(crate) fn dim(&self, dimension: usize) -> Result<u64> {
        self.size_info
            .as_ref()
            .and_then(|sizes| sizes.get(dimension).copied())
            .ok_or(NdrError::MissingSizeInfo { dimension })
    }

    /// Replace a zero dimension with a count decoded from the content
    pub(crate) fn infer(&mut self, dimension: usize, count: u64) {
        if let Some(size) = self
            .size_info
            .as_mut()
            .and_then(|sizes| sizes.get_mut(dimension))
        {
            if count > 0 && *size == 0 {
                *size = count;
            }
        }
    }
}
