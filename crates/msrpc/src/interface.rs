//! Interface and operation descriptors
//!
//! An interface owns a contiguous run of operation numbers that starts
//! right after the last operation of its single base interface. Opnums are
//! global along the inheritance chain.

use crate::error::RpcError;
use crate::syntax::SyntaxId;
use msrpc_ndr::{NdrDecode, NdrEncode};
use std::fmt;

/// Static description of one interface version
#[derive(Debug)]
pub struct InterfaceDescriptor {
    pub name: &'static str,
    pub syntax: SyntaxId,
    pub base: Option<&'static InterfaceDescriptor>,
    /// Operation names in opnum order, starting at [`first_opnum`](Self::first_opnum)
    pub operations: &'static [&'static str],
}

impl InterfaceDescriptor {
    pub const fn new(
        name: &'static str,
        syntax: SyntaxId,
        base: Option<&'static InterfaceDescriptor>,
        operations: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            syntax,
            base,
            operations,
        }
    }

    /// First opnum owned by this interface
    pub fn first_opnum(&self) -> u16 {
        self.base.map_or(0, |base| base.total())
    }

    /// Number of operations in the whole chain up to and including this one
    pub fn total(&self) -> u16 {
        self.first_opnum() + self.operations.len() as u16
    }

    pub fn owns(&self, opnum: u16) -> bool {
        opnum >= self.first_opnum() && opnum < self.total()
    }

    /// This interface followed by its ancestors, leaf first
    pub fn chain(&self) -> impl Iterator<Item = &InterfaceDescriptor> {
        std::iter::successors(Some(self), |iface| iface.base)
    }

    /// Whether `other` is this interface or one of its ancestors
    pub fn inherits(&self, other: &InterfaceDescriptor) -> bool {
        self.chain().any(|iface| iface.syntax == other.syntax)
    }

    /// Operation with global number `opnum`, searched up the chain
    pub fn resolve(&self, opnum: u16) -> Option<OperationDescriptor> {
        self.chain().find(|iface| iface.owns(opnum)).map(|iface| OperationDescriptor {
            interface: iface.name,
            opnum,
            name: iface.operations[(opnum - iface.first_opnum()) as usize],
        })
    }
}

impl PartialEq for InterfaceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.syntax == other.syntax
    }
}

impl Eq for InterfaceDescriptor {}

impl fmt::Display for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.syntax)
    }
}

/// Resolved operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Name of the interface that declares the operation
    pub interface: &'static str,
    pub opnum: u16,
    pub name: &'static str,
}

/// One remote operation and its parameter shapes
///
/// `Request` holds the in-parameters and `Response` the out-parameters
/// (without the return status). Each is written as a top-level value.
pub trait Operation {
    type Request: NdrEncode + NdrDecode + Send + 'static;
    type Response: NdrEncode + NdrDecode + Send + 'static;

    /// Interface that declares the operation
    const INTERFACE: &'static InterfaceDescriptor;
    /// Global opnum in the inheritance chain
    const OPNUM: u16;
    const NAME: &'static str;

    /// Error a handler returns to fail the call with `status` and no
    /// response body
    fn fault(status: u32) -> RpcError {
        RpcError::Handler {
            operation: Self::NAME,
            status,
        }
    }
}
