//! Return status codes and their descriptions
//!
//! Responses end with a signed 32-bit status. Text for a status comes from a
//! [`StatusTable`]; [`WellKnownStatus`] covers the codes this crate itself
//! produces plus the common HRESULT and Win32 values.

/// HRESULT codes commonly used in DCOM
pub mod hresult {
    pub const S_OK: u32 = 0x00000000;
    pub const S_FALSE: u32 = 0x00000001;
    pub const E_NOTIMPL: u32 = 0x80004001;
    pub const E_NOINTERFACE: u32 = 0x80004002;
    pub const E_POINTER: u32 = 0x80004003;
    pub const E_FAIL: u32 = 0x80004005;
    pub const E_UNEXPECTED: u32 = 0x8000FFFF;
    pub const E_ACCESSDENIED: u32 = 0x80070005;
    pub const E_OUTOFMEMORY: u32 = 0x8007000E;
    pub const E_INVALIDARG: u32 = 0x80070057;
    pub const RPC_E_SERVER_DIED: u32 = 0x80010007;
}

/// Win32 error codes seen as RPC return values
pub mod win32 {
    pub const ERROR_SUCCESS: u32 = 0;
    pub const ERROR_ACCESS_DENIED: u32 = 5;
    pub const ERROR_INVALID_PARAMETER: u32 = 87;
    pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
    pub const ERROR_OBJECT_NOT_FOUND: u32 = 4312;
    pub const ERROR_DATABASE_FAILURE: u32 = 4313;
    pub const RPC_X_BAD_STUB_DATA: u32 = 1783;
}

/// NCA fault status codes
pub mod nca {
    pub const OP_RNG_ERROR: u32 = 0x1C010002;
    pub const UNK_IF: u32 = 0x1C010003;
}

/// Error-table collaborator mapping a status to text
pub trait StatusTable: Send + Sync {
    fn describe(&self, status: u32) -> Option<String>;
}

/// Built-in descriptions for common codes
#[derive(Debug, Clone, Copy, Default)]
pub struct WellKnownStatus;

impl StatusTable for WellKnownStatus {
    fn describe(&self, status: u32) -> Option<String> {
        let text = match status {
            hresult::S_OK => "success",
            hresult::S_FALSE => "success (false)",
            hresult::E_NOTIMPL => "not implemented",
            hresult::E_NOINTERFACE => "no such interface supported",
            hresult::E_POINTER => "invalid pointer",
            hresult::E_FAIL => "unspecified error",
            hresult::E_UNEXPECTED => "catastrophic failure",
            hresult::E_ACCESSDENIED | win32::ERROR_ACCESS_DENIED => "access denied",
            hresult::E_OUTOFMEMORY => "out of memory",
            hresult::E_INVALIDARG | win32::ERROR_INVALID_PARAMETER => "invalid argument",
            hresult::RPC_E_SERVER_DIED => "the server died",
            win32::ERROR_INSUFFICIENT_BUFFER => "insufficient buffer",
            win32::ERROR_OBJECT_NOT_FOUND => "object not found",
            win32::ERROR_DATABASE_FAILURE => "database failure",
            win32::RPC_X_BAD_STUB_DATA => "bad stub data",
            nca::OP_RNG_ERROR => "operation number out of range",
            nca::UNK_IF => "unknown interface",
            _ => return None,
        };
        Some(text.to_string())
    }
}

/// Description of `status`, falling back to its hex form
pub fn describe_status(table: &dyn StatusTable, status: i32) -> String {
    table
        .describe(status as u32)
        .unwrap_or_else(|| format!("unknown status 0x{:08x}", status as u32))
}
