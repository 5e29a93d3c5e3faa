//! Client invoker
//!
//! A [`Client`] is bound to one interface and may call any operation
//! declared by that interface or one of its ancestors.

use crate::config::ClientConfig;
use crate::conn::Conn;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::{Result, RpcError};
use crate::interface::{InterfaceDescriptor, Operation};
use crate::orpc::OrpcThis;
use crate::status::{describe_status, StatusTable, WellKnownStatus};
use msrpc_ndr::{NdrReader, NdrWriter};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Client {
    conn: Arc<dyn Conn>,
    interface: &'static InterfaceDescriptor,
    config: ClientConfig,
    status_table: Arc<dyn StatusTable>,
}

impl Client {
    /// Client for `interface` over `conn`
    pub async fn connect(
        conn: Arc<dyn Conn>,
        interface: &'static InterfaceDescriptor,
        config: ClientConfig,
    ) -> Result<Self> {
        if config.bind_on_connect {
            conn.bind(interface.syntax).await?;
            debug!(interface = interface.name, syntax = %interface.syntax, "bound");
        }
        Ok(Self {
            conn,
            interface,
            config,
            status_table: Arc::new(WellKnownStatus),
        })
    }

    /// Describe nonzero return statuses with `table`
    pub fn with_status_table(mut self, table: Arc<dyn StatusTable>) -> Self {
        self.status_table = table;
        self
    }

    pub fn interface(&self) -> &'static InterfaceDescriptor {
        self.interface
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Move this client to another interface on the same association
    pub async fn alter_context(&mut self, interface: &'static InterfaceDescriptor) -> Result<()> {
        self.conn.alter_context(interface.syntax).await?;
        self.interface = interface;
        Ok(())
    }

    /// Fresh `ORPCTHIS` for one call
    pub fn orpc_this(&self) -> OrpcThis {
        OrpcThis::new(self.config.com_version)
    }

    /// Call `Op` and return its out-parameters
    ///
    /// A nonzero return status becomes [`RpcError::Status`].
    pub async fn call<Op: Operation>(&self, request: Op::Request) -> Result<Op::Response> {
        let envelope = RequestEnvelope::new(self.orpc_this(), request);
        let response = self.call_envelope::<Op>(&envelope).await?;
        if response.status != 0 {
            let description = describe_status(self.status_table.as_ref(), response.status);
            warn!(operation = Op::NAME, status = response.status, %description, "remote status");
            return Err(RpcError::Status {
                operation: Op::NAME,
                status: response.status,
                description,
            });
        }
        Ok(response.body)
    }

    /// Call `Op` with a caller-built envelope and return the whole response
    pub async fn call_envelope<Op: Operation>(
        &self,
        request: &RequestEnvelope<Op::Request>,
    ) -> Result<ResponseEnvelope<Op::Response>> {
        if !self.interface.inherits(Op::INTERFACE) {
            return Err(RpcError::InterfaceNotInChain {
                interface: self.interface.name,
                operation: Op::NAME,
            });
        }

        let mut w = NdrWriter::with_limits(self.config.ndr, self.config.limits);
        w.write_value(request)?;
        let stub = w.into_bytes();

        debug!(operation = Op::NAME, opnum = Op::OPNUM, request_len = stub.len(), "invoking");
        let reply = self.conn.invoke(self.interface.syntax, Op::OPNUM, stub).await?;
        debug!(operation = Op::NAME, response_len = reply.len(), "response received");

        let mut r = NdrReader::with_context(reply, self.config.ndr);
        Ok(r.read_value()?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("interface", &self.interface.name)
            .field("config", &self.config)
            .finish()
    }
}
