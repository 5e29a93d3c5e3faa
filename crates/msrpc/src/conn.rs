//! Transport boundary
//!
//! Binding, endpoint resolution, security and fragmentation live behind
//! [`Conn`]. Stub data crosses it as whole messages.

use crate::error::Result;
use crate::server::ServerHandle;
use crate::syntax::SyntaxId;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// One association with a peer
#[async_trait]
pub trait Conn: Send + Sync {
    /// Establish a presentation context for `syntax`
    async fn bind(&self, syntax: SyntaxId) -> Result<()>;

    /// Add a presentation context to an existing association
    async fn alter_context(&self, syntax: SyntaxId) -> Result<()>;

    /// Send a request stub and wait for the response stub
    async fn invoke(&self, syntax: SyntaxId, opnum: u16, stub: Bytes) -> Result<Bytes>;

    /// Serve incoming calls for `handle`'s abstract syntax
    async fn register_server(&self, handle: Arc<dyn ServerHandle>) -> Result<()>;
}
