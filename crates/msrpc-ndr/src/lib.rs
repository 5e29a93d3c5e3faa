//! NDR (Network Data Representation) runtime library
//!
//! Marshalling support for DCE/RPC and MS-RPCE interface stubs.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes),
//!   measured from the start of the stub data
//! - Size, offset and count fields are 64-bit and 8-byte aligned
//! - A conformant structure writes its array dimensions once, ahead of
//!   everything else, and nested arrays reuse them
//! - Unique and full pointers write a referent ID inline; the referent
//!   follows all inline data of the embedding value
//!
//! Every wire type implements [`NdrEncode`] and [`NdrDecode`]; values that
//! carry array dimensions also implement [`NdrSizeInfo`]. A call encodes
//! into one [`NdrWriter`] and decodes from one [`NdrReader`].

mod arrays;
mod conformance;
mod context;
mod cursor;
mod decode;
mod encode;
mod error;
mod pointers;
mod primitives;
mod strings;
mod union;

pub use arrays::{ConformantArray, ConformantVaryingArray, FixedArray, VaryingArray};
pub use conformance::{size_from_content, DecodeState, EncodeState, NdrSizeInfo};
pub use context::{CodecLimits, NdrContext, DEFAULT_FIRST_REFERENT_ID};
pub use cursor::{NdrReader, NdrWriter, POINTER_ALIGN, SIZE_ALIGN};
pub use decode::NdrDecode;
pub use encode::NdrEncode;
pub use error::{NdrError, Result};
pub use pointers::{FullPtr, NdrPtr, RefPtr, UniquePtr};
pub use primitives::{Guid, NdrEnum, NdrPrimitive};
pub use strings::{NdrMultiString, NdrString, NdrWString};
pub use union::{Encapsulated, NdrUnion};

/// Re-export bytes for convenience
pub use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Encode `value` as a complete little-endian message
pub fn to_bytes<T: NdrEncode + ?Sized>(value: &T) -> Result<Bytes> {
    let mut w = NdrWriter::new();
    w.write_value(value)?;
    Ok(w.into_bytes())
}

/// Decode a complete little-endian message
pub fn from_bytes<T: NdrDecode>(data: impl Into<Bytes>) -> Result<T> {
    NdrReader::new(data).read_value()
}
