//! NDR decoding trait

use crate::{NdrReader, Result};

/// Trait for types that can be decoded from NDR format
///
/// Mirrors [`NdrEncode`](crate::NdrEncode): `unmarshal_ndr` reads the
/// inline part and leaves non-null pointers pending, and
/// `unmarshal_ndr_deferred` reads their referents in declaration order.
pub trait NdrDecode: Sized {
    /// Read the inline representation at the reader's current position.
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self>;

    /// Read the referents of pointers left pending by `unmarshal_ndr`.
    fn unmarshal_ndr_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }
}

impl<T: NdrDecode> NdrDecode for Box<T> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        T::unmarshal_ndr(r).map(Box::new)
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        (**self).unmarshal_ndr_deferred(r)
    }
}
