//! NDR error types

use thiserror::Error;

/// NDR encoding/decoding errors
///
/// Every variant is fatal to the call that produced it: the partially built
/// value or message is dropped and the error is propagated unchanged.
#[derive(Debug, Error)]
pub enum NdrError {
    /// A fixed-width read needs more bytes than remain
    #[error("buffer exhausted: needed {needed} bytes, {remaining} remaining")]
    BufferExhausted { needed: usize, remaining: usize },

    /// A declared count/size is larger than the rest of the message
    #[error("buffer overflow for size {size}: {remaining} bytes remaining")]
    BufferOverflow { size: u64, remaining: usize },

    /// Alignment padding runs past the end of the message
    #[error("alignment fault: {padding} padding bytes for {alignment}-byte alignment, {remaining} remaining")]
    AlignmentFault {
        alignment: usize,
        padding: usize,
        remaining: usize,
    },

    /// Writer would grow past its configured maximum
    #[error("message capacity exceeded: {requested} bytes requested, limit {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    /// Transmitted element count exceeds the declared capacity
    #[error("conformance mismatch: max_count={max_count}, actual_count={actual_count}")]
    ConformanceMismatch { max_count: u64, actual_count: u64 },

    /// A conformant field was reached with no size information in scope
    #[error("missing size information for dimension {dimension}")]
    MissingSizeInfo { dimension: usize },

    /// Invalid string - bad offset or missing terminator
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Union discriminant has no matching arm
    #[error("unsupported switch case value {0}")]
    UnsupportedSwitch(u32),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16(#[from] std::char::DecodeUtf16Error),
}

impl NdrError {
    /// True for faults caused by lengths that do not fit the buffer
    pub fn is_buffer_fault(&self) -> bool {
        matches!(
            self,
            Self::BufferExhausted { .. } | Self::BufferOverflow { .. } | Self::AlignmentFault { .. }
        )
    }
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
