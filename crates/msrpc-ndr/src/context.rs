//! NDR data representation and codec limits
//!
//! [`NdrContext`] carries the declared byte order of a message; every
//! fixed-width primitive goes through it. [`CodecLimits`] bounds what a
//! writer may produce and how it numbers pointer referents.

use bytes::{Buf, BufMut};

/// Declared data representation of one message
///
/// Only the integer/float byte order varies in practice; characters are
/// always ASCII and floats always IEEE.
#[derive(Debug, Clone, Copy)]
pub struct NdrContext {
    /// `true` for little-endian integers and floats
    pub little_endian: bool,
}

impl NdrContext {
    /// Little-endian, the representation Windows peers send
    pub const fn new() -> Self {
        Self::with_byte_order(true)
    }

    pub const fn big_endian() -> Self {
        Self::with_byte_order(false)
    }

    pub const fn with_byte_order(little_endian: bool) -> Self {
        NdrContext { little_endian }
    }

    /// Padding needed to bring `position` (offset from message start) to
    /// a multiple of `alignment`
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        match alignment {
            0 | 1 => 0,
            a => (a - position % a) % a,
        }
    }
}

macro_rules! byte_order_accessors {
    ($($ty:ty: $put:ident / $put_le:ident, $get:ident / $get_le:ident;)*) => {
        impl NdrContext {
            $(
                #[inline]
                pub fn $put<B: BufMut>(&self, buf: &mut B, value: $ty) {
                    if self.little_endian {
                        buf.$put_le(value)
                    } else {
                        buf.$put(value)
                    }
                }

                #[inline]
                pub fn $get<B: Buf>(&self, buf: &mut B) -> $ty {
                    if self.little_endian {
                        buf.$get_le()
                    } else {
                        buf.$get()
                    }
                }
            )*
        }
    };
}

// single bytes have no byte order
byte_order_accessors! {
    u8: put_u8 / put_u8, get_u8 / get_u8;
    i8: put_i8 / put_i8, get_i8 / get_i8;
    u16: put_u16 / put_u16_le, get_u16 / get_u16_le;
    i16: put_i16 / put_i16_le, get_i16 / get_i16_le;
    u32: put_u32 / put_u32_le, get_u32 / get_u32_le;
    i32: put_i32 / put_i32_le, get_i32 / get_i32_le;
    u64: put_u64 / put_u64_le, get_u64 / get_u64_le;
    i64: put_i64 / put_i64_le, get_i64 / get_i64_le;
    f32: put_f32 / put_f32_le, get_f32 / get_f32_le;
    f64: put_f64 / put_f64_le, get_f64 / get_f64_le;
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}

/// First referent ID handed out by a writer, matching what Windows stubs emit
pub const DEFAULT_FIRST_REFERENT_ID: u32 = 0x0002_0000;

/// Limits and numbering policy for one writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Largest message a writer may produce, in bytes
    pub max_message_size: usize,
    /// Referent ID written for the first non-null full/unique pointer
    pub first_referent_id: u32,
    /// Increment between consecutive referent IDs
    pub referent_id_step: u32,
}

impl CodecLimits {
    /// Limits with a bounded message size
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            ..Self::default()
        }
    }
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_message_size: usize::MAX,
            first_referent_id: DEFAULT_FIRST_REFERENT_ID,
            referent_id_step: 4,
        }
    }
}
