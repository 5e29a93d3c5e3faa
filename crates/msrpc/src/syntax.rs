//! Abstract syntax identifiers

use msrpc_ndr::Guid;
use std::fmt;

/// Interface UUID plus version; names one presentation context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxId {
    pub uuid: Guid,
    pub major: u16,
    pub minor: u16,
}

impl SyntaxId {
    pub const fn new(uuid: Guid, major: u16, minor: u16) -> Self {
        Self { uuid, major, minor }
    }

    /// Version as carried in bind PDUs: major in the low 16 bits
    pub fn version(&self) -> u32 {
        (self.major as u32) | ((self.minor as u32) << 16)
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.major, self.minor)
    }
}

/// NDR transfer syntax 8a885d04-1ceb-11c9-9fe8-08002b104860 v2.0
pub const NDR_TRANSFER_SYNTAX: SyntaxId =
    SyntaxId::new(Guid::from_u128(0x8a885d04_1ceb_11c9_9fe8_08002b104860), 2, 0);
