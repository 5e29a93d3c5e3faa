//! Error types for calls and dispatch

use crate::status::{hresult, nca, win32};
use msrpc_ndr::NdrError;
use thiserror::Error;

/// RPC call and dispatch errors
#[derive(Debug, Error)]
pub enum RpcError {
    /// Stub data could not be encoded or decoded
    #[error("NDR error: {0}")]
    Ndr(#[from] NdrError),

    /// Opnum outside every range of the interface chain
    #[error("unknown operation {opnum} on interface {interface}")]
    UnknownOperation { interface: &'static str, opnum: u16 },

    /// Opnum is valid but no handler is registered for it
    #[error("{interface}::{operation} (opnum {opnum}) is not implemented")]
    UnimplementedOperation {
        interface: &'static str,
        operation: &'static str,
        opnum: u16,
    },

    /// Server answered with a nonzero return status
    #[error("{operation}: status 0x{status:08x}: {description}")]
    Status {
        operation: &'static str,
        status: i32,
        description: String,
    },

    /// Handler failed without producing a response; see
    /// [`Operation::fault`](crate::Operation::fault)
    #[error("{operation} failed with status 0x{status:08x}")]
    Handler { operation: &'static str, status: u32 },

    /// Operation belongs to an interface outside the bound chain
    #[error("operation {operation} is not part of interface {interface}")]
    InterfaceNotInChain {
        interface: &'static str,
        operation: &'static str,
    },

    /// No presentation context for the abstract syntax
    #[error("interface {0} is not bound")]
    NotBound(String),
}

impl RpcError {
    /// Status a server reports to the peer for this error
    pub fn fault_status(&self) -> u32 {
        match self {
            Self::UnknownOperation { .. } => nca::OP_RNG_ERROR,
            Self::UnimplementedOperation { .. } => hresult::E_NOTIMPL,
            Self::Handler { status, .. } => *status,
            Self::Status { status, .. } => *status as u32,
            Self::Ndr(_) => win32::RPC_X_BAD_STUB_DATA,
            Self::NotBound(_) => nca::UNK_IF,
            Self::InterfaceNotInChain { .. } => hresult::E_FAIL,
        }
    }

    /// True when the error came from hostile or corrupt stub lengths
    pub fn is_buffer_fault(&self) -> bool {
        matches!(self, Self::Ndr(e) if e.is_buffer_fault())
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
