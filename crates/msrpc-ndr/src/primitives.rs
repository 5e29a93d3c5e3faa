//! NDR primitive type implementations
//!
//! | IDL Type       | Rust Type | Size | Alignment |
//! |----------------|-----------|------|-----------|
//! | boolean        | bool      | 2    | 2         |
//! | byte/char      | u8        | 1    | 1         |
//! | small          | i8        | 1    | 1         |
//! | short          | i16       | 2    | 2         |
//! | long/int       | i32       | 4    | 4         |
//! | hyper          | i64       | 8    | 8         |
//! | unsigned short | u16       | 2    | 2         |
//! | unsigned long  | u32       | 4    | 4         |
//! | unsigned hyper | u64       | 8    | 8         |
//! | float          | f32       | 4    | 4         |
//! | double         | f64       | 8    | 8         |
//! | enum           | u16       | 2    | 2         |
//! | GUID           | Guid      | 16   | 4         |
//!
//! Booleans travel as 16-bit integers: `-1` for true, `0` for false. Any
//! nonzero value reads back as true.

use crate::{NdrContext, NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};
use bytes::{Buf, BufMut};
use std::fmt;

/// Fixed-width scalar aligned to its own size
pub trait NdrPrimitive: Copy {
    /// Wire size in bytes, also the alignment
    const SIZE: usize;

    fn put<B: BufMut>(self, ctx: &NdrContext, buf: &mut B);

    fn get<B: Buf>(ctx: &NdrContext, buf: &mut B) -> Self;
}

macro_rules! impl_ndr_primitive {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl NdrPrimitive for $ty {
            const SIZE: usize = $size;

            #[inline]
            fn put<B: BufMut>(self, ctx: &NdrContext, buf: &mut B) {
                ctx.$put(buf, self);
            }

            #[inline]
            fn get<B: Buf>(ctx: &NdrContext, buf: &mut B) -> Self {
                ctx.$get(buf)
            }
        }

        impl NdrEncode for $ty {
            fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
                w.write_data(*self)
            }
        }

        impl NdrDecode for $ty {
            fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
                r.read_data()
            }
        }
    };
}

impl_ndr_primitive!(u8, 1, put_u8, get_u8);
impl_ndr_primitive!(i8, 1, put_i8, get_i8);
impl_ndr_primitive!(u16, 2, put_u16, get_u16);
impl_ndr_primitive!(i16, 2, put_i16, get_i16);
impl_ndr_primitive!(u32, 4, put_u32, get_u32);
impl_ndr_primitive!(i32, 4, put_i32, get_i32);
impl_ndr_primitive!(u64, 8, put_u64, get_u64);
impl_ndr_primitive!(i64, 8, put_i64, get_i64);
impl_ndr_primitive!(f32, 4, put_f32, get_f32);
impl_ndr_primitive!(f64, 8, put_f64, get_f64);

impl NdrPrimitive for bool {
    const SIZE: usize = 2;

    #[inline]
    fn put<B: BufMut>(self, ctx: &NdrContext, buf: &mut B) {
        ctx.put_i16(buf, if self { -1 } else { 0 });
    }

    #[inline]
    fn get<B: Buf>(ctx: &NdrContext, buf: &mut B) -> Self {
        ctx.get_i16(buf) != 0
    }
}

impl NdrEncode for bool {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(*self)
    }
}

impl NdrDecode for bool {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        r.read_data()
    }
}

/// Enumerations carried as unvalidated 16-bit values
///
/// Decoding never rejects a value; types keep unknown values around so
/// they re-encode unchanged. See [`ndr_enum!`](crate::ndr_enum).
pub trait NdrEnum: Sized {
    fn to_ndr(&self) -> u16;

    fn from_ndr(value: u16) -> Self;
}

/// GUID in its NDR layout: one u32, two u16, then eight raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const NIL: Self = Self::new(0, 0, 0, [0; 8]);

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Build from the 128-bit big-endian form used by textual UUIDs
    pub const fn from_u128(value: u128) -> Self {
        Self {
            data1: (value >> 96) as u32,
            data2: (value >> 80) as u16,
            data3: (value >> 64) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    pub const fn to_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | (u64::from_be_bytes(self.data4) as u128)
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('{').trim_end_matches('}');
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 5 || parts[3].len() != 4 || parts[4].len() != 12 {
            return None;
        }
        let hex: String = parts.concat();
        u128::from_str_radix(&hex, 16).ok().map(Self::from_u128)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1],
        )?;
        for b in &self.data4[2..] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl NdrEncode for Guid {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_align(4)?;
        w.write_data(self.data1)?;
        w.write_data(self.data2)?;
        w.write_data(self.data3)?;
        w.write_bytes(&self.data4)
    }
}

impl NdrDecode for Guid {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        r.read_align(4)?;
        let data1 = r.read_data()?;
        let data2 = r.read_data()?;
        let data3 = r.read_data()?;
        let mut data4 = [0u8; 8];
        r.read_bytes(8)?.copy_to_slice(&mut data4);
        Ok(Self::new(data1, data2, data3, data4))
    }
}
