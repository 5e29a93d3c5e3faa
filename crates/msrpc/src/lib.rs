//! ORPC call envelopes and opnum dispatch
//!
//! Builds on [`msrpc_ndr`] to give interface stubs:
//!
//! - `ORPCTHIS`/`ORPCTHAT` headers and request/response envelopes
//! - Interface descriptors with single-inheritance opnum ranges
//! - A [`Router`] that forwards inherited opnums to its base interface
//! - A [`Client`] invoker and a server registrar over an opaque [`Conn`]

pub mod client;
pub mod config;
pub mod conn;
pub mod envelope;
pub mod error;
pub mod interface;
pub mod orpc;
pub mod router;
pub mod server;
pub mod status;
pub mod syntax;

pub use client::Client;
pub use config::{ClientConfig, ServerConfig};
pub use conn::Conn;
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use error::{Result, RpcError};
pub use interface::{InterfaceDescriptor, Operation, OperationDescriptor};
pub use orpc::{ComVersion, OrpcExtent, OrpcExtentArray, OrpcThat, OrpcThis};
pub use router::{OperationHandler, Router, RouterBuilder};
pub use server::{dispatch, register_server, ServerHandle};
pub use status::{describe_status, StatusTable, WellKnownStatus};
pub use syntax::{SyntaxId, NDR_TRANSFER_SYNTAX};

pub use msrpc_ndr as ndr;
