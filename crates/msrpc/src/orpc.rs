//! ORPC (Object RPC) header types (MS-DCOM 2.2.13, 2.2.14)
//!
//! `ORPCTHIS` opens every DCOM request and `ORPCTHAT` every response.

use msrpc_ndr::{
    size_from_content, ConformantArray, Guid, NdrDecode, NdrEncode, NdrPtr, NdrReader, NdrSizeInfo, NdrWriter,
    Result, UniquePtr,
};

/// COM version structure (MS-DCOM 2.2.11)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ComVersion {
    pub major: u16,
    pub minor: u16,
}

impl ComVersion {
    /// DCOM version 5.1 (Windows 2000)
    pub const DCOM_5_1: Self = Self { major: 5, minor: 1 };
    /// DCOM version 5.4 (Windows XP/2003)
    pub const DCOM_5_4: Self = Self { major: 5, minor: 4 };
    /// DCOM version 5.6 (Windows Vista)
    pub const DCOM_5_6: Self = Self { major: 5, minor: 6 };
    /// DCOM version 5.7 (Windows 7)
    pub const DCOM_5_7: Self = Self { major: 5, minor: 7 };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl NdrEncode for ComVersion {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(self.major)?;
        w.write_data(self.minor)
    }
}

impl NdrDecode for ComVersion {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        Ok(Self {
            major: r.read_data()?,
            minor: r.read_data()?,
        })
    }
}

/// One ORPC extension (MS-DCOM 2.2.21.1)
///
/// The data array is transmitted padded to a multiple of 8 bytes; `size`
/// counts the meaningful bytes. A zero `size` is taken from `data`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OrpcExtent {
    pub id: Guid,
    pub size: u32,
    pub data: Vec<u8>,
}

impl OrpcExtent {
    pub fn new(id: Guid, data: Vec<u8>) -> Self {
        Self {
            id,
            size: data.len() as u32,
            data,
        }
    }

    fn wire_size(&self) -> u32 {
        size_from_content(self.size as u64, self.data.len()) as u32
    }
}

fn padded_extent_size(size: u32) -> u64 {
    (size as u64 + 7) & !7
}

impl NdrSizeInfo for OrpcExtent {
    fn ndr_size_info(&self) -> Vec<u64> {
        vec![padded_extent_size(self.wire_size())]
    }
}

impl NdrEncode for OrpcExtent {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.with_size_info(self, |w| {
            w.write_align(4)?;
            self.id.marshal_ndr(w)?;
            w.write_data(self.wire_size())?;
            let capacity = w.size_dim(0)? as usize;
            let present = capacity.min(self.data.len());
            w.write_bytes(&self.data[..present])?;
            w.write_bytes(&vec![0; capacity - present])
        })
    }
}

impl NdrDecode for OrpcExtent {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        r.with_size_info(1, |r| {
            r.read_align(4)?;
            let id = Guid::unmarshal_ndr(r)?;
            let size: u32 = r.read_data()?;
            r.infer_size_dim(0, padded_extent_size(size));
            let capacity = r.check_size(r.size_dim(0)?)?;
            let mut data = r.read_bytes(capacity)?.to_vec();
            data.truncate(size as usize);
            Ok(Self { id, size, data })
        })
    }
}

/// ORPC extension array (MS-DCOM 2.2.21.2)
///
/// The extent slots are padded to an even count with null pointers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OrpcExtentArray {
    pub size: u32,
    pub reserved: u32,
    pub extent: UniquePtr<ConformantArray<UniquePtr<OrpcExtent>>>,
}

impl OrpcExtentArray {
    pub fn new(extents: Vec<OrpcExtent>) -> Self {
        let size = extents.len() as u32;
        let mut slots: Vec<UniquePtr<OrpcExtent>> = extents.into_iter().map(UniquePtr::new).collect();
        if slots.len() % 2 == 1 {
            slots.push(UniquePtr::null());
        }
        let extent = if slots.is_empty() {
            UniquePtr::null()
        } else {
            UniquePtr::new(ConformantArray::new(slots))
        };
        Self {
            size,
            reserved: 0,
            extent,
        }
    }

    /// Non-null extents in slot order
    pub fn extents(&self) -> impl Iterator<Item = &OrpcExtent> {
        self.extent
            .get()
            .into_iter()
            .flat_map(|slots| slots.iter().filter_map(|slot| slot.get()))
    }

    /// First extent carrying `id`
    pub fn find(&self, id: &Guid) -> Option<&OrpcExtent> {
        self.extents().find(|extent| extent.id == *id)
    }
}

impl NdrEncode for OrpcExtentArray {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(self.size)?;
        w.write_data(self.reserved)?;
        self.extent.marshal_ndr(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.extent.marshal_ndr_deferred(w)
    }
}

impl NdrDecode for OrpcExtentArray {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        Ok(Self {
            size: r.read_data()?,
            reserved: r.read_data()?,
            extent: UniquePtr::unmarshal_ndr(r)?,
        })
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.extent.unmarshal_ndr_deferred(r)
    }
}

/// ORPCTHIS structure (MS-DCOM 2.2.13)
///
/// Sent with every ORPC request from client to server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrpcThis {
    pub version: ComVersion,
    /// Flags (must be 0)
    pub flags: u32,
    /// Reserved (must be 0)
    pub reserved1: u32,
    /// Causality ID (UUID identifying the call chain)
    pub cid: Guid,
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThis {
    /// Header for a new call chain with a fresh causality ID
    pub fn new(version: ComVersion) -> Self {
        Self::with_causality(version, Guid::from_u128(uuid::Uuid::new_v4().as_u128()))
    }

    pub fn with_causality(version: ComVersion, cid: Guid) -> Self {
        Self {
            version,
            flags: 0,
            reserved1: 0,
            cid,
            extensions: UniquePtr::null(),
        }
    }

    pub fn with_extensions(mut self, extensions: OrpcExtentArray) -> Self {
        self.extensions = UniquePtr::new(extensions);
        self
    }
}

impl Default for OrpcThis {
    fn default() -> Self {
        Self::new(ComVersion::DCOM_5_7)
    }
}

impl NdrEncode for OrpcThis {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        self.version.marshal_ndr(w)?;
        w.write_data(self.flags)?;
        w.write_data(self.reserved1)?;
        self.cid.marshal_ndr(w)?;
        self.extensions.marshal_ndr(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.extensions.marshal_ndr_deferred(w)
    }
}

impl NdrDecode for OrpcThis {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        Ok(Self {
            version: ComVersion::unmarshal_ndr(r)?,
            flags: r.read_data()?,
            reserved1: r.read_data()?,
            cid: Guid::unmarshal_ndr(r)?,
            extensions: UniquePtr::unmarshal_ndr(r)?,
        })
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.extensions.unmarshal_ndr_deferred(r)
    }
}

/// ORPCTHAT structure (MS-DCOM 2.2.14)
///
/// Sent with every ORPC response from server to client.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OrpcThat {
    /// Flags (must be 0)
    pub flags: u32,
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThat {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NdrEncode for OrpcThat {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(self.flags)?;
        self.extensions.marshal_ndr(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.extensions.marshal_ndr_deferred(w)
    }
}

impl NdrDecode for OrpcThat {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        Ok(Self {
            flags: r.read_data()?,
            extensions: UniquePtr::unmarshal_ndr(r)?,
        })
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.extensions.unmarshal_ndr_deferred(r)
    }
}
