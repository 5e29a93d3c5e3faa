//! NDR array types
//!
//! - Fixed arrays: size known at compile time, elements only
//! - Conformant arrays: capacity comes from the size context
//! - Varying arrays: fixed bound, offset and length transmitted inline
//! - Conformant varying arrays: capacity from the size context, then
//!   offset and length
//!
//! Writers truncate a collection longer than its capacity and zero-fill a
//! shorter one up to it. Readers materialize exactly the transmitted
//! length, checked against the remaining bytes; nothing is zero-filled on
//! the way in. The deferred pass sends referents for exactly the elements
//! the inline pass sent.

use crate::conformance::{size_from_content, NdrSizeInfo};
use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};
use std::ops::{Deref, DerefMut};

/// Write `count` elements from `elements`, zero-filling past its end
fn write_elements<T: NdrEncode + Default>(w: &mut NdrWriter, elements: &[T], count: usize) -> Result<()> {
    for element in elements.iter().take(count) {
        element.marshal_ndr(w)?;
    }
    if count > elements.len() {
        let fill = T::default();
        for _ in elements.len()..count {
            fill.marshal_ndr(w)?;
        }
    }
    Ok(())
}

fn write_elements_deferred<T: NdrEncode>(w: &mut NdrWriter, elements: &[T], count: usize) -> Result<()> {
    for element in elements.iter().take(count) {
        element.marshal_ndr_deferred(w)?;
    }
    Ok(())
}

fn read_elements<T: NdrDecode>(r: &mut NdrReader, count: u64) -> Result<Vec<T>> {
    let count = r.check_size(count)?;
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(T::unmarshal_ndr(r)?);
    }
    Ok(elements)
}

fn read_elements_deferred<T: NdrDecode>(r: &mut NdrReader, elements: &mut [T]) -> Result<()> {
    for element in elements {
        element.unmarshal_ndr_deferred(r)?;
    }
    Ok(())
}

/// Fixed-size array
///
/// Wire format: just the elements (no size prefix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default + Copy, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: [T::default(); N],
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        for element in &self.elements {
            element.marshal_ndr(w)?;
        }
        Ok(())
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        write_elements_deferred(w, &self.elements, N)
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for FixedArray<T, N> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let mut elements = Vec::with_capacity(N);
        for _ in 0..N {
            elements.push(T::unmarshal_ndr(r)?);
        }
        let elements = elements.try_into().map_err(|v: Vec<T>| NdrError::ConformanceMismatch {
            max_count: N as u64,
            actual_count: v.len() as u64,
        })?;
        Ok(Self { elements })
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        read_elements_deferred(r, &mut self.elements)
    }
}

/// Conformant array
///
/// Wire format: capacity (from the size context) followed by that many
/// elements. Standalone, the array writes its own length as the capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantArray<T>(pub Vec<T>);

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self(elements)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self(elements)
    }
}

impl<T> Deref for ConformantArray<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> DerefMut for ConformantArray<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.0
    }
}

impl<T> NdrSizeInfo for ConformantArray<T> {
    fn ndr_size_info(&self) -> Vec<u64> {
        vec![self.0.len() as u64]
    }
}

impl<T: NdrEncode + Default> NdrEncode for ConformantArray<T> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.with_size_info(self, |w| {
            let capacity = w.size_dim(0)? as usize;
            w.record_transmitted(self, capacity);
            write_elements(w, &self.0, capacity)
        })
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        let count = w.transmitted(self).unwrap_or(self.0.len());
        write_elements_deferred(w, &self.0, count)
    }
}

impl<T: NdrDecode> NdrDecode for ConformantArray<T> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        r.with_size_info(Self::DIMENSIONS, |r| {
            let capacity = r.size_dim(0)?;
            read_elements(r, capacity).map(Self)
        })
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        read_elements_deferred(r, &mut self.0)
    }
}

/// Varying array with a compile-time bound
///
/// Wire format: offset and length (inline) followed by `length` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T, const N: usize> {
    pub elements: Vec<T>,
}

impl<T, const N: usize> Default for VaryingArray<T, N> {
    fn default() -> Self {
        Self { elements: Vec::new() }
    }
}

impl<T, const N: usize> VaryingArray<T, N> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    fn transmitted(&self) -> usize {
        self.elements.len().min(N)
    }
}

impl<T: NdrEncode + Default, const N: usize> NdrEncode for VaryingArray<T, N> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        let length = self.transmitted();
        w.write_size(0)?;
        w.write_size(length as u64)?;
        write_elements(w, &self.elements, length)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        write_elements_deferred(w, &self.elements, self.transmitted())
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for VaryingArray<T, N> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let offset = r.read_size()?;
        let length = r.read_size()?;
        if offset.saturating_add(length) > N as u64 {
            return Err(NdrError::ConformanceMismatch {
                max_count: N as u64,
                actual_count: offset.saturating_add(length),
            });
        }
        read_elements(r, length).map(Self::new)
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        read_elements_deferred(r, &mut self.elements)
    }
}

/// Conformant varying array
///
/// Wire format: capacity (from the size context), offset, length, then
/// `length` elements. A zero capacity or length is a placeholder for the
/// element count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantVaryingArray<T> {
    pub capacity: u64,
    pub length: u64,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    /// Capacity and length both taken from the elements
    pub fn new(elements: Vec<T>) -> Self {
        Self::with_length(0, 0, elements)
    }

    /// Transmit `capacity` elements, zero-filled past the collection
    pub fn with_capacity(capacity: u64, elements: Vec<T>) -> Self {
        Self::with_length(capacity, capacity, elements)
    }

    /// Reserve `capacity` elements but transmit only `length`
    pub fn with_length(capacity: u64, length: u64, elements: Vec<T>) -> Self {
        Self {
            capacity,
            length,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn declared_capacity(&self) -> u64 {
        size_from_content(self.capacity, self.elements.len())
    }

    fn declared_length(&self, capacity: u64) -> u64 {
        size_from_content(self.length, self.elements.len()).min(capacity)
    }
}

impl<T> NdrSizeInfo for ConformantVaryingArray<T> {
    fn ndr_size_info(&self) -> Vec<u64> {
        vec![self.declared_capacity()]
    }
}

impl<T: NdrEncode + Default> NdrEncode for ConformantVaryingArray<T> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.with_size_info(self, |w| {
            let capacity = w.size_dim(0)?;
            let length = self.declared_length(capacity);
            w.write_size(0)?;
            w.write_size(length)?;
            w.record_transmitted(self, length as usize);
            write_elements(w, &self.elements, length as usize)
        })
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        let length = match w.transmitted(self) {
            Some(length) => length,
            None => self.declared_length(self.declared_capacity()) as usize,
        };
        write_elements_deferred(w, &self.elements, length)
    }
}

impl<T: NdrDecode> NdrDecode for ConformantVaryingArray<T> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        r.with_varying_size_info(Self::DIMENSIONS, |r| {
            let capacity = r.size_dim(0)?;
            let offset = r.read_size()?;
            let length = r.read_size()?;
            if offset.saturating_add(length) > capacity {
                return Err(NdrError::ConformanceMismatch {
                    max_count: capacity,
                    actual_count: offset.saturating_add(length),
                });
            }
            let elements = read_elements(r, length)?;
            Ok(Self::with_length(capacity, length, elements))
        })
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        read_elements_deferred(r, &mut self.elements)
    }
}
