//! NDR string types
//!
//! NDR strings are conformant varying arrays with a NUL terminator.
//!
//! Wire format:
//! ```text
//! max_count: u64    # Maximum elements including NUL
//! offset: u64       # Always 0
//! actual_count: u64 # Transmitted elements including NUL
//! chars[actual_count]
//! ```
//!
//! Wide strings count UTF-16 code units, so a character outside the BMP
//! occupies two elements.

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};
use std::borrow::Cow;
use std::fmt;

/// Read and validate a string header, returning the element count
fn read_string_header(r: &mut NdrReader, unit: usize) -> Result<usize> {
    let max_count = r.read_size()?;
    let offset = r.read_size()?;
    let actual_count = r.read_size()?;

    if offset != 0 {
        return Err(NdrError::InvalidString(format!("nonzero offset {}", offset)));
    }
    if actual_count > max_count {
        return Err(NdrError::ConformanceMismatch {
            max_count,
            actual_count,
        });
    }
    let needed = actual_count.saturating_mul(unit as u64);
    if needed > r.len() as u64 {
        return Err(NdrError::BufferExhausted {
            needed: usize::try_from(needed).unwrap_or(usize::MAX),
            remaining: r.len(),
        });
    }
    Ok(actual_count as usize)
}

fn write_string_header(w: &mut NdrWriter, count: usize) -> Result<()> {
    w.write_size(count as u64)?;
    w.write_size(0)?;
    w.write_size(count as u64)
}

fn read_units(r: &mut NdrReader, count: usize) -> Result<Vec<u16>> {
    let mut units = Vec::with_capacity(count);
    for _ in 0..count {
        units.push(r.read_data::<u16>()?);
    }
    Ok(units)
}

fn write_units(w: &mut NdrWriter, units: &[u16]) -> Result<()> {
    for unit in units {
        w.write_data(*unit)?;
    }
    Ok(())
}

/// 8-bit string (`[string] char*`)
///
/// The payload is whatever the peer's ANSI or OEM code page produced, so it
/// is kept as bytes; nothing is validated on decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrString(pub Vec<u8>);

impl NdrString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Text view, with bytes that are not UTF-8 replaced by U+FFFD
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<String> for NdrString {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for NdrString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for NdrString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for NdrString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NdrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl NdrEncode for NdrString {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        write_string_header(w, self.0.len() + 1)?;
        w.write_bytes(&self.0)?;
        w.write_bytes(&[0])
    }
}

impl NdrDecode for NdrString {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let count = read_string_header(r, 1)?;
        let raw = r.read_bytes(count)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(Self(raw[..end].to_vec()))
    }
}

/// UTF-16 string (`[string] wchar_t*`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrWString(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for NdrWString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for NdrWString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl NdrEncode for NdrWString {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        let mut units: Vec<u16> = self.0.encode_utf16().collect();
        units.push(0);
        write_string_header(w, units.len())?;
        write_units(w, &units)
    }
}

impl NdrDecode for NdrWString {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let count = read_string_header(r, 2)?;
        let units = read_units(r, count)?;
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        let s = char::decode_utf16(units[..end].iter().copied()).collect::<std::result::Result<String, _>>()?;
        Ok(Self(s))
    }
}

/// Double-NUL terminated list of UTF-16 strings (`REG_MULTI_SZ` layout)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrMultiString(pub Vec<String>);

impl NdrMultiString {
    pub fn new(strings: Vec<String>) -> Self {
        Self(strings)
    }

    fn to_units(&self) -> Vec<u16> {
        let mut units = Vec::new();
        for s in &self.0 {
            units.extend(s.encode_utf16());
            units.push(0);
        }
        if self.0.is_empty() {
            units.push(0);
        }
        units.push(0);
        units
    }
}

impl NdrEncode for NdrMultiString {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        let units = self.to_units();
        write_string_header(w, units.len())?;
        write_units(w, &units)
    }
}

impl NdrDecode for NdrMultiString {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let count = read_string_header(r, 2)?;
        let units = read_units(r, count)?;

        let mut strings = Vec::new();
        for part in units.split(|&u| u == 0) {
            // an empty element marks the end of the list
            if part.is_empty() {
                break;
            }
            let s = char::decode_utf16(part.iter().copied()).collect::<std::result::Result<String, _>>()?;
            strings.push(s);
        }
        Ok(Self(strings))
    }
}
