//! Server registrar

use crate::config::ServerConfig;
use crate::conn::Conn;
use crate::error::Result;
use crate::interface::OperationDescriptor;
use crate::router::Router;
use crate::syntax::SyntaxId;
use bytes::Bytes;
use msrpc_ndr::{NdrReader, NdrWriter};
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point a transport calls for incoming requests
pub trait ServerHandle: Send + Sync {
    /// Abstract syntax the handle serves
    fn syntax(&self) -> SyntaxId;

    /// Decode the request for `opnum` from `r` and encode the response
    fn handle(&self, opnum: u16, r: &mut NdrReader, w: &mut NdrWriter) -> Result<OperationDescriptor>;
}

impl ServerHandle for Router {
    fn syntax(&self) -> SyntaxId {
        self.descriptor().syntax
    }

    fn handle(&self, opnum: u16, r: &mut NdrReader, w: &mut NdrWriter) -> Result<OperationDescriptor> {
        Router::handle(self, opnum, r, w)
    }
}

/// Install `router` on `conn` under its interface's syntax
pub async fn register_server(conn: &dyn Conn, router: Router) -> Result<()> {
    let descriptor = router.descriptor();
    info!(
        "Registering interface: {} version {}.{}",
        descriptor.name, descriptor.syntax.major, descriptor.syntax.minor
    );
    conn.register_server(Arc::new(router)).await
}

/// Run one request stub through `handle`
///
/// The returned stub is complete; on error nothing of the partial response
/// is kept.
pub fn dispatch(handle: &dyn ServerHandle, opnum: u16, stub: Bytes, config: &ServerConfig) -> Result<Bytes> {
    let mut r = NdrReader::with_context(stub, config.ndr);
    let mut w = NdrWriter::with_limits(config.ndr, config.limits);
    let op = handle.handle(opnum, &mut r, &mut w)?;
    debug!(
        operation = op.name,
        opnum,
        response_len = w.position(),
        unread = r.len(),
        "request served"
    );
    Ok(w.into_bytes())
}
