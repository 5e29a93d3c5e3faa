//! Opnum dispatch across an interface inheritance chain
//!
//! A [`Router`] serves one interface version. Opnums below its first own
//! opnum go to the router of its base interface, the rest to its own
//! handlers.

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::{Result, RpcError};
use crate::interface::{InterfaceDescriptor, Operation, OperationDescriptor};
use msrpc_ndr::{NdrReader, NdrWriter};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Type-erased operation handler: decodes the request, writes the response
pub type OperationHandler = Arc<dyn Fn(&mut NdrReader, &mut NdrWriter) -> Result<()> + Send + Sync>;

/// Dispatch table for one interface, chained to its base
pub struct Router {
    descriptor: &'static InterfaceDescriptor,
    base: Option<Box<Router>>,
    handlers: HashMap<u16, OperationHandler>,
}

impl Router {
    pub fn builder(descriptor: &'static InterfaceDescriptor) -> RouterBuilder {
        RouterBuilder {
            descriptor,
            base: None,
            handlers: HashMap::new(),
            misplaced: None,
        }
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    pub fn resolve(&self, opnum: u16) -> Option<OperationDescriptor> {
        self.descriptor.resolve(opnum)
    }

    /// Route `opnum`, decoding from `r` and encoding the response into `w`
    pub fn handle(&self, opnum: u16, r: &mut NdrReader, w: &mut NdrWriter) -> Result<OperationDescriptor> {
        let first = self.descriptor.first_opnum();
        if opnum < first {
            if let Some(base) = &self.base {
                trace!(interface = self.descriptor.name, opnum, "forwarding to {}", base.descriptor.name);
                return base.handle(opnum, r, w);
            }
            // base interface resolved but nobody serves it
            return Err(self.missing(opnum));
        }

        let op = self.descriptor.resolve(opnum).ok_or_else(|| {
            warn!(interface = self.descriptor.name, opnum, "unknown operation");
            RpcError::UnknownOperation {
                interface: self.descriptor.name,
                opnum,
            }
        })?;

        match self.handlers.get(&opnum) {
            Some(handler) => {
                debug!(interface = op.interface, operation = op.name, opnum, "dispatching");
                handler(r, w)?;
                Ok(op)
            }
            None => Err(self.missing(opnum)),
        }
    }

    fn missing(&self, opnum: u16) -> RpcError {
        match self.descriptor.resolve(opnum) {
            Some(op) => {
                warn!(interface = op.interface, operation = op.name, opnum, "operation not implemented");
                RpcError::UnimplementedOperation {
                    interface: op.interface,
                    operation: op.name,
                    opnum,
                }
            }
            None => RpcError::UnknownOperation {
                interface: self.descriptor.name,
                opnum,
            },
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut opnums: Vec<_> = self.handlers.keys().copied().collect();
        opnums.sort_unstable();
        f.debug_struct("Router")
            .field("interface", &self.descriptor.name)
            .field("handlers", &opnums)
            .field("base", &self.base)
            .finish()
    }
}

/// Builder for [`Router`]
pub struct RouterBuilder {
    descriptor: &'static InterfaceDescriptor,
    base: Option<Router>,
    handlers: HashMap<u16, OperationHandler>,
    misplaced: Option<(&'static str, &'static str)>,
}

impl RouterBuilder {
    /// Router for the base interface
    pub fn base(mut self, base: Router) -> Self {
        self.base = Some(base);
        self
    }

    /// Register the handler for `Op`
    ///
    /// `Op` must be declared by this router's interface; ancestor
    /// operations belong on the base router.
    pub fn operation<Op, F>(mut self, handler: F) -> Self
    where
        Op: Operation,
        F: Fn(RequestEnvelope<Op::Request>) -> Result<ResponseEnvelope<Op::Response>> + Send + Sync + 'static,
    {
        if Op::INTERFACE != self.descriptor {
            self.misplaced.get_or_insert((Op::INTERFACE.name, Op::NAME));
            return self;
        }
        let handler: OperationHandler = Arc::new(move |r: &mut NdrReader, w: &mut NdrWriter| {
            let request: RequestEnvelope<Op::Request> = r.read_value()?;
            let response = handler(request)?;
            w.write_value(&response)?;
            Ok(())
        });
        self.handlers.insert(Op::OPNUM, handler);
        self
    }

    pub fn build(self) -> Result<Router> {
        if let Some((interface, operation)) = self.misplaced {
            return Err(RpcError::InterfaceNotInChain { interface, operation });
        }
        if let Some(base) = &self.base {
            if self.descriptor.base != Some(base.descriptor) {
                return Err(RpcError::InterfaceNotInChain {
                    interface: self.descriptor.name,
                    operation: base.descriptor.name,
                });
            }
        }
        Ok(Router {
            descriptor: self.descriptor,
            base: self.base.map(Box::new),
            handlers: self.handlers,
        })
    }
}
