//! Client and server configuration

use crate::orpc::ComVersion;
use msrpc_ndr::{CodecLimits, NdrContext};

/// Client invoker configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Data representation of request stubs
    pub ndr: NdrContext,
    pub limits: CodecLimits,
    /// Version placed in every `ORPCTHIS`
    pub com_version: ComVersion,
    /// Bind the interface when the client is created
    pub bind_on_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ndr: NdrContext::new(),
            limits: CodecLimits::default(),
            com_version: ComVersion::DCOM_5_7,
            bind_on_connect: true,
        }
    }
}

/// Server dispatch configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub ndr: NdrContext,
    pub limits: CodecLimits,
}

impl ServerConfig {
    pub fn with_max_response_size(max_response_size: usize) -> Self {
        Self {
            limits: CodecLimits::with_max_message_size(max_response_size),
            ..Self::default()
        }
    }
}
