//! Byte cursors over one NDR message
//!
//! [`NdrWriter`] and [`NdrReader`] track the offset from the start of the
//! stub data, apply alignment relative to it, and own the per-call size
//! context. One writer or reader serves exactly one call tree.

use crate::conformance::{DecodeState, EncodeState, NdrSizeInfo};
use crate::primitives::{NdrEnum, NdrPrimitive};
use crate::{CodecLimits, NdrContext, NdrDecode, NdrEncode, NdrError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

/// Alignment of size, offset and count fields
pub const SIZE_ALIGN: usize = 8;

/// Alignment of pointer referent IDs
pub const POINTER_ALIGN: usize = 4;

/// Write cursor
#[derive(Debug)]
pub struct NdrWriter {
    buf: BytesMut,
    ctx: NdrContext,
    limits: CodecLimits,
    state: EncodeState,
    next_referent_id: u32,
    referents_written: usize,
}

impl NdrWriter {
    /// Little-endian writer with default limits
    pub fn new() -> Self {
        Self::with_limits(NdrContext::new(), CodecLimits::default())
    }

    pub fn with_context(ctx: NdrContext) -> Self {
        Self::with_limits(ctx, CodecLimits::default())
    }

    pub fn with_limits(ctx: NdrContext, limits: CodecLimits) -> Self {
        Self {
            buf: BytesMut::new(),
            ctx,
            limits,
            state: EncodeState::default(),
            next_referent_id: limits.first_referent_id,
            referents_written: 0,
        }
    }

    /// Offset from the start of the message
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    pub fn state(&self) -> &EncodeState {
        &self.state
    }

    /// Number of pointer referents written so far
    pub fn referents_written(&self) -> usize {
        self.referents_written
    }

    /// Bytes written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        let requested = self.buf.len().saturating_add(n);
        if requested > self.limits.max_message_size {
            return Err(NdrError::CapacityExceeded {
                requested,
                limit: self.limits.max_message_size,
            });
        }
        Ok(())
    }

    /// Zero-fill up to the next multiple of `alignment`
    pub fn write_align(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.buf.len(), alignment);
        self.reserve(padding)?;
        self.buf.put_bytes(0, padding);
        Ok(())
    }

    /// Pad the end of a structure to its alignment
    pub fn write_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        self.write_align(alignment)
    }

    /// Write a fixed-width primitive at its natural alignment
    pub fn write_data<T: NdrPrimitive>(&mut self, value: T) -> Result<()> {
        self.write_align(T::SIZE)?;
        self.reserve(T::SIZE)?;
        value.put(&self.ctx, &mut self.buf);
        Ok(())
    }

    /// Write raw bytes with no alignment
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Write a size, offset or count field
    pub fn write_size(&mut self, size: u64) -> Result<()> {
        self.write_align(SIZE_ALIGN)?;
        self.reserve(8)?;
        self.ctx.put_u64(&mut self.buf, size);
        Ok(())
    }

    /// Write an enumeration as its 16-bit wire value
    pub fn write_enum<E: NdrEnum>(&mut self, value: E) -> Result<()> {
        self.write_data(value.to_ndr())
    }

    /// Write a union discriminant
    pub fn write_switch(&mut self, switch: u32) -> Result<()> {
        self.write_data(switch)
    }

    /// Write the referent ID of a full/unique pointer
    ///
    /// A null pointer is written as zero; a non-null one gets the next
    /// referent ID, and the caller owes its referent in the deferred pass.
    pub fn write_pointer(&mut self, non_null: bool) -> Result<u32> {
        self.write_align(POINTER_ALIGN)?;
        let id = if non_null {
            let id = self.next_referent_id;
            self.next_referent_id = self.next_referent_id.wrapping_add(self.limits.referent_id_step);
            id
        } else {
            0
        };
        self.reserve(4)?;
        self.ctx.put_u32(&mut self.buf, id);
        Ok(id)
    }

    /// Write a pointer referent: inline part, then its own deferred data
    pub fn write_referent<T: NdrEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.referents_written += 1;
        self.write_value(value)
    }

    /// Write a complete top-level value, deferred referents included
    pub fn write_value<T: NdrEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.state.push_value();
        let result = match value.marshal_ndr(self) {
            Ok(()) => value.marshal_ndr_deferred(self),
            Err(e) => Err(e),
        };
        self.state.pop_value();
        result
    }

    /// Remember that the array at `array` sent `count` elements inline
    pub fn record_transmitted<A: ?Sized>(&mut self, array: &A, count: usize) {
        self.state.record_transmitted(array as *const A as *const () as usize, count);
    }

    /// Element count the array at `array` sent inline, if recorded
    pub fn transmitted<A: ?Sized>(&mut self, array: &A) -> Option<usize> {
        self.state.take_transmitted(array as *const A as *const () as usize)
    }

    /// Run `f` with the dimensions of `value` in scope
    ///
    /// The outermost conformant value writes its dimensions here; nested
    /// values reuse what is already in scope.
    pub fn with_size_info<S, R, F>(&mut self, value: &S, f: F) -> Result<R>
    where
        S: NdrSizeInfo + ?Sized,
        F: FnOnce(&mut Self) -> Result<R>,
    {
        if self.state.is_active() {
            return f(self);
        }
        let sizes = value.ndr_size_info();
        for size in &sizes {
            self.write_size(*size)?;
        }
        trace!(?sizes, "size info written");
        self.state.enter(sizes);
        let result = f(self);
        self.state.leave();
        result
    }

    /// Dimension `dimension` of the size info in scope
    pub fn size_dim(&self, dimension: usize) -> Result<u64> {
        self.state.dim(dimension)
    }
}

impl Default for NdrWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Read cursor
#[derive(Debug)]
pub struct NdrReader {
    buf: Bytes,
    consumed: usize,
    ctx: NdrContext,
    state: DecodeState,
    referents_read: usize,
}

impl NdrReader {
    /// Little-endian reader over `data`
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_context(data, NdrContext::new())
    }

    pub fn with_context(data: impl Into<Bytes>, ctx: NdrContext) -> Self {
        Self {
            buf: data.into(),
            consumed: 0,
            ctx,
            state: DecodeState::default(),
            referents_read: 0,
        }
    }

    /// Offset from the start of the message
    #[inline]
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Remaining bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Number of pointer referents read so far
    pub fn referents_read(&self) -> usize {
        self.referents_read
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(NdrError::BufferExhausted {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) {
        self.buf.advance(n);
        self.consumed += n;
    }

    /// Skip padding up to the next multiple of `alignment`
    pub fn read_align(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.consumed, alignment);
        if padding > self.buf.remaining() {
            return Err(NdrError::AlignmentFault {
                alignment,
                padding,
                remaining: self.buf.remaining(),
            });
        }
        self.advance(padding);
        Ok(())
    }

    pub fn read_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        self.read_align(alignment)
    }

    /// Read a fixed-width primitive at its natural alignment
    pub fn read_data<T: NdrPrimitive>(&mut self) -> Result<T> {
        self.read_align(T::SIZE)?;
        self.ensure(T::SIZE)?;
        let value = T::get(&self.ctx, &mut self.buf);
        self.consumed += T::SIZE;
        Ok(value)
    }

    /// Read `n` raw bytes with no alignment
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        let bytes = self.buf.split_to(n);
        self.consumed += n;
        Ok(bytes)
    }

    /// Read a size, offset or count field
    pub fn read_size(&mut self) -> Result<u64> {
        self.read_align(SIZE_ALIGN)?;
        self.ensure(8)?;
        let size = self.ctx.get_u64(&mut self.buf);
        self.consumed += 8;
        Ok(size)
    }

    pub fn read_enum<E: NdrEnum>(&mut self) -> Result<E> {
        self.read_data::<u16>().map(E::from_ndr)
    }

    pub fn read_switch(&mut self) -> Result<u32> {
        self.read_data()
    }

    /// Read a full/unique pointer referent ID; `true` means non-null
    pub fn read_pointer(&mut self) -> Result<bool> {
        self.read_align(POINTER_ALIGN)?;
        Ok(self.read_data::<u32>()? != 0)
    }

    /// Read a pointer referent: inline part, then its own deferred data
    pub fn read_referent<T: NdrDecode>(&mut self) -> Result<T> {
        self.referents_read += 1;
        self.read_value()
    }

    /// Read a complete top-level value, deferred referents included
    pub fn read_value<T: NdrDecode>(&mut self) -> Result<T> {
        let mut value = T::unmarshal_ndr(self)?;
        value.unmarshal_ndr_deferred(self)?;
        Ok(value)
    }

    /// Reject a declared size that cannot fit in the rest of the message
    ///
    /// Must run before anything is allocated for the declared size.
    pub fn check_size(&self, size: u64) -> Result<usize> {
        let remaining = self.buf.remaining();
        if size > remaining as u64 {
            warn!(size, remaining, "declared size exceeds remaining buffer");
            return Err(NdrError::BufferOverflow { size, remaining });
        }
        Ok(size as usize)
    }

    /// Run `f` with `dimensions` sizes in scope
    ///
    /// The outermost conformant value reads and validates its dimensions
    /// here; nested values reuse what is already in scope.
    pub fn with_size_info<R, F>(&mut self, dimensions: usize, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.enter_size_info(dimensions, true, f)
    }

    /// Like [`with_size_info`](Self::with_size_info) for values whose
    /// dimensions are capacities of varying arrays
    ///
    /// A capacity only bounds the transmitted length, so it is not held
    /// against the remaining bytes here; each array checks its length
    /// before reading elements.
    pub fn with_varying_size_info<R, F>(&mut self, dimensions: usize, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.enter_size_info(dimensions, false, f)
    }

    fn enter_size_info<R, F>(&mut self, dimensions: usize, checked: bool, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        if self.state.is_active() {
            return f(self);
        }
        let mut sizes = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            let size = self.read_size()?;
            if checked {
                self.check_size(size)?;
            }
            sizes.push(size);
        }
        trace!(?sizes, checked, "size info read");
        self.state.enter(sizes);
        let result = f(self);
        self.state.leave();
        result
    }

    pub fn size_dim(&self, dimension: usize) -> Result<u64> {
        self.state.dim(dimension)
    }

    /// Replace a zero dimension in scope with a decoded nonzero count
    pub fn infer_size_dim(&mut self, dimension: usize, count: u64) {
        self.state.infer(dimension, count);
    }
}
