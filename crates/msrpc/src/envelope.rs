//! Request and response envelopes
//!
//! A request is `ORPCTHIS` followed by the operation's in-parameters; a
//! response is `ORPCTHAT`, the out-parameters, and the signed 32-bit return
//! status. Each piece is a top-level value, so its deferred referents follow
//! it directly.

use crate::orpc::{OrpcThat, OrpcThis};
use msrpc_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// In-parameters of one call
#[derive(Clone, Debug, PartialEq)]
pub struct RequestEnvelope<T> {
    pub this: OrpcThis,
    pub body: T,
}

impl<T> RequestEnvelope<T> {
    pub fn new(this: OrpcThis, body: T) -> Self {
        Self { this, body }
    }
}

impl<T: NdrEncode> NdrEncode for RequestEnvelope<T> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.this)?;
        w.write_value(&self.body)
    }
}

impl<T: NdrDecode> NdrDecode for RequestEnvelope<T> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let this = r.read_value()?;
        let body = r.read_value()?;
        Ok(Self { this, body })
    }
}

/// Out-parameters and return status of one call
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseEnvelope<T> {
    pub that: OrpcThat,
    pub body: T,
    /// Return value; zero is success
    pub status: i32,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(body: T) -> Self {
        Self::with_status(body, 0)
    }

    pub fn with_status(body: T, status: i32) -> Self {
        Self {
            that: OrpcThat::new(),
            body,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

impl<T: NdrEncode> NdrEncode for ResponseEnvelope<T> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.that)?;
        w.write_value(&self.body)?;
        w.write_data(self.status)
    }
}

impl<T: NdrDecode> NdrDecode for ResponseEnvelope<T> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let that = r.read_value()?;
        let body = r.read_value()?;
        let status = r.read_data()?;
        Ok(Self { that, body, status })
    }
}
