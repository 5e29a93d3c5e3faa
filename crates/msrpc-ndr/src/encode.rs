//! NDR encoding trait

use crate::{NdrWriter, Result};

/// Trait for types that can be encoded to NDR format
///
/// Encoding is split in two passes. `marshal_ndr` writes the inline part of
/// the value; embedded full/unique pointers contribute only their referent
/// ID. `marshal_ndr_deferred` then writes the referents of those pointers,
/// in declaration order. Use [`NdrWriter::write_value`] to run both passes
/// for a top-level parameter.
pub trait NdrEncode {
    /// Write the inline representation at the writer's current position.
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()>;

    /// Write the deferred referents of embedded pointers.
    fn marshal_ndr_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }
}

impl<T: NdrEncode + ?Sized> NdrEncode for &T {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_ndr(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_ndr_deferred(w)
    }
}

impl<T: NdrEncode + ?Sized> NdrEncode for Box<T> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_ndr(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_ndr_deferred(w)
    }
}
