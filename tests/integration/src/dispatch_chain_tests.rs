//! Dispatch Chain Tests
//!
//! Opnum routing across single-inheritance interface chains:
//! - Each opnum reaches the router of the interface that declares it
//! - Opnums the chain declares but nobody serves fault as unimplemented
//! - Opnums past the end of the chain fault as unknown
//! - A client bound to a derived interface calls superclass operations

mod common;

use std::sync::Arc;

use common::rsm::*;
use common::*;
use msrpc::ndr::{Guid, NdrWString, UniquePtr};
use msrpc::status::{hresult, nca};
use msrpc::{
    register_server, Client, ClientConfig, InterfaceDescriptor, Operation, ResponseEnvelope, Router, RpcError,
    SyntaxId,
};

const IBASE: InterfaceDescriptor = InterfaceDescriptor::new(
    "IBase",
    SyntaxId::new(Guid::from_u128(0x5a1e0001_0000_4000_8000_00000000b45e), 1, 0),
    None,
    &["B0", "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8"],
);

const IMID: InterfaceDescriptor = InterfaceDescriptor::new(
    "IMid",
    SyntaxId::new(Guid::from_u128(0x5a1e0002_0000_4000_8000_0000000000d1), 1, 0),
    Some(&IBASE),
    &["M9", "M10", "M11", "M12", "M13"],
);

const ILEAF: InterfaceDescriptor = InterfaceDescriptor::new(
    "ILeaf",
    SyntaxId::new(Guid::from_u128(0x5a1e0003_0000_4000_8000_0000000001ea), 1, 0),
    Some(&IMID),
    &["L14", "L15"],
);

macro_rules! tagged_operation {
    ($name:ident, $iface:expr, $opnum:expr) => {
        struct $name;

        impl Operation for $name {
            type Request = u32;
            type Response = u32;
            const INTERFACE: &'static InterfaceDescriptor = &$iface;
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = stringify!($name);
        }
    };
}

tagged_operation!(B3, IBASE, 3);
tagged_operation!(B4, IBASE, 4);
tagged_operation!(M11, IMID, 11);
tagged_operation!(L15, ILEAF, 15);
tagged_operation!(Beyond, ILEAF, 99);

const BASE_TAG: u32 = 0xB000;
const MID_TAG: u32 = 0x3000;
const LEAF_TAG: u32 = 0x1000;

/// Leaf router whose handlers answer with their level's tag plus the input
fn tagged_chain() -> Router {
    let base = Router::builder(&IBASE)
        .operation::<B3, _>(|req| Ok(ResponseEnvelope::ok(BASE_TAG + req.body)))
        .build()
        .unwrap();
    let mid = Router::builder(&IMID)
        .base(base)
        .operation::<M11, _>(|req| Ok(ResponseEnvelope::ok(MID_TAG + req.body)))
        .build()
        .unwrap();
    Router::builder(&ILEAF)
        .base(mid)
        .operation::<L15, _>(|req| Ok(ResponseEnvelope::ok(LEAF_TAG + req.body)))
        .build()
        .unwrap()
}

async fn tagged_client() -> (Arc<LoopbackConn>, Client) {
    let conn = LoopbackConn::new();
    register_server(conn.as_ref(), tagged_chain()).await.unwrap();
    let client = Client::connect(conn.clone(), &ILEAF, ClientConfig::default())
        .await
        .unwrap();
    (conn, client)
}

async fn library_client(interface: &'static InterfaceDescriptor) -> (Arc<LoopbackConn>, Arc<Library>, Client) {
    let library = Library::new();
    let conn = LoopbackConn::new();
    register_server(conn.as_ref(), library_server(library.clone()).unwrap())
        .await
        .unwrap();
    let client = Client::connect(conn.clone(), interface, ClientConfig::default())
        .await
        .unwrap();
    (conn, library, client)
}

#[test]
fn test_opnum_ranges() {
    init_logging();

    assert_eq!(IBASE.first_opnum(), 0);
    assert_eq!(IMID.first_opnum(), 9);
    assert_eq!(ILEAF.first_opnum(), 14);
    assert_eq!(ILEAF.total(), 16);

    let router = tagged_chain();
    assert_eq!(router.resolve(3).map(|op| op.interface), Some("IBase"));
    assert_eq!(router.resolve(11).map(|op| op.interface), Some("IMid"));
    assert_eq!(router.resolve(15).map(|op| op.interface), Some("ILeaf"));
    assert!(router.resolve(99).is_none());
}

#[tokio::test]
async fn test_each_opnum_served_by_declaring_level() {
    init_logging();

    let (conn, client) = tagged_client().await;

    assert_eq!(client.call::<B3>(1).await.unwrap(), BASE_TAG + 1);
    assert_eq!(client.call::<M11>(2).await.unwrap(), MID_TAG + 2);
    assert_eq!(client.call::<L15>(3).await.unwrap(), LEAF_TAG + 3);
    assert_eq!(conn.calls(), 3);
    assert!(conn.faults().is_empty());
}

#[tokio::test]
async fn test_opnum_past_chain_is_unknown() {
    init_logging();

    let (conn, client) = tagged_client().await;

    let err = client.call::<Beyond>(0).await.unwrap_err();
    assert!(matches!(err, RpcError::UnknownOperation { interface: "ILeaf", opnum: 99 }));
    assert_eq!(conn.faults(), vec![nca::OP_RNG_ERROR]);
}

#[tokio::test]
async fn test_declared_but_unserved_is_unimplemented() {
    init_logging();

    let (conn, client) = tagged_client().await;

    let err = client.call::<B4>(0).await.unwrap_err();
    assert!(matches!(
        err,
        RpcError::UnimplementedOperation { interface: "IBase", operation: "B4", opnum: 4 }
    ));
    assert_eq!(conn.faults(), vec![hresult::E_NOTIMPL]);

    // the association stays usable after a fault
    assert_eq!(client.call::<L15>(0).await.unwrap(), LEAF_TAG);
}

#[tokio::test]
async fn test_rsm_chain_layout() {
    init_logging();

    assert_eq!(INTMS_OBJECT_MANAGEMENT1.first_opnum(), 3);
    assert_eq!(INTMS_OBJECT_MANAGEMENT2.first_opnum(), 12);
    assert_eq!(INTMS_OBJECT_MANAGEMENT3.first_opnum(), 17);
    assert_eq!(INTMS_OBJECT_MANAGEMENT3.total(), 19);

    let names: Vec<_> = INTMS_OBJECT_MANAGEMENT3.chain().map(|iface| iface.name).collect();
    assert_eq!(
        names,
        ["INtmsObjectManagement3", "INtmsObjectManagement2", "INtmsObjectManagement1", "IUnknown"]
    );

    let op = INTMS_OBJECT_MANAGEMENT3.resolve(EnumerateNtmsObject::OPNUM).unwrap();
    assert_eq!(op.interface, "INtmsObjectManagement1");
    assert_eq!(op.name, "EnumerateNtmsObject");
    assert_eq!(INTMS_OBJECT_MANAGEMENT3.resolve(0).unwrap().name, "QueryInterface");
    assert!(INTMS_OBJECT_MANAGEMENT3.resolve(19).is_none());
}

#[tokio::test]
async fn test_superclass_operations_through_leaf_client() {
    init_logging();

    let (conn, library, client) = library_client(&INTMS_OBJECT_MANAGEMENT3).await;
    let drive_a = Guid::from_u128(0xd41e_0000_0000_0000_0000_0000_0000_000a);
    let drive_b = Guid::from_u128(0xd41e_0000_0000_0000_0000_0000_0000_000b);
    let library_id = Guid::from_u128(0x11b0_0000_0000_0000_0000_0000_0000_0001);
    library.add_object(drive_a, object_type::DRIVE);
    library.add_object(drive_b, object_type::DRIVE);
    library.add_object(library_id, object_type::LIBRARY);
    library.set_destinations(library_id, &["OPS-CONSOLE", "BACKUP-01"]);
    library.set_attribute(drive_a, "SerialNumber", b"HU19487TXC");

    // IUnknown (opnum 1)
    assert_eq!(client.call::<AddRef>(NoOutput).await.unwrap(), 2);

    // INtmsObjectManagement1 (opnum 9)
    let drives = client
        .call::<EnumerateNtmsObject>(EnumerateRequest {
            list_buffer_size: 8,
            object_type: object_type::DRIVE,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(drives.list_size, 2);
    assert_eq!(drives.list.elements, vec![drive_a, drive_b]);

    // INtmsObjectManagement2 (opnum 14)
    let options = client
        .call::<GetNtmsUIOptionsW>(UiOptionsRequest {
            object_id: UniquePtr::new(library_id),
            ui_type: 1,
            buffer_size: 512,
        })
        .await
        .unwrap();
    assert_eq!(options.destinations.0, vec!["OPS-CONSOLE", "BACKUP-01"]);

    // INtmsObjectManagement3 (opnum 18)
    let serial = client
        .call::<GetNtmsObjectAttributeWR>(AttributeRequest {
            object_id: UniquePtr::new(drive_a),
            object_type: object_type::DRIVE,
            attribute_name: NdrWString::new("SerialNumber"),
            buffer_size: 4096,
        })
        .await
        .unwrap();
    assert_eq!(serial.attribute_size, 10);
    // the reply reserves the caller's whole buffer but carries ten bytes
    assert_eq!(serial.data.capacity, 4096);
    assert_eq!(serial.data.length, 10);
    assert_eq!(serial.data.elements, b"HU19487TXC");

    assert_eq!(conn.calls(), 4);
    assert!(conn.faults().is_empty());
}

#[tokio::test]
async fn test_unserved_rsm_operations() {
    init_logging();

    let (conn, library, client) = library_client(&INTMS_OBJECT_MANAGEMENT3).await;
    let media = Guid::from_u128(0x3ed1_a000_0000_0000_0000_0000_0000_0001);
    library.add_object(media, object_type::PHYSICAL_MEDIA);

    let err = client
        .call::<DisableNtmsObject>(ObjectRef {
            object_id: media,
            object_type: object_type::PHYSICAL_MEDIA,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RpcError::UnimplementedOperation {
            interface: "INtmsObjectManagement1",
            operation: "DisableNtmsObject",
            opnum: 10,
        }
    ));
    assert_eq!(err.fault_status(), hresult::E_NOTIMPL);
    assert_eq!(conn.faults(), vec![hresult::E_NOTIMPL]);
    assert!(library.object(&media).unwrap().enabled);
}

#[tokio::test]
async fn test_enable_through_mid_level_client() {
    init_logging();

    let (_conn, library, client) = library_client(&INTMS_OBJECT_MANAGEMENT2).await;
    let media = Guid::from_u128(0x3ed1_a000_0000_0000_0000_0000_0000_0002);
    library.add_object(media, object_type::PHYSICAL_MEDIA);
    library.add_object(Guid::from_u128(0x3ed1_a000_0000_0000_0000_0000_0000_0003), object_type::DRIVE);
    library.disable(&media);

    let enumerate = || EnumerateRequest {
        list_buffer_size: 4,
        object_type: object_type::PHYSICAL_MEDIA,
        ..Default::default()
    };
    assert_eq!(client.call::<EnumerateNtmsObject>(enumerate()).await.unwrap().list_size, 0);

    client
        .call::<EnableNtmsObject>(ObjectRef {
            object_id: media,
            object_type: object_type::PHYSICAL_MEDIA,
        })
        .await
        .unwrap();
    assert!(library.object(&media).unwrap().enabled);

    let media_list = client.call::<EnumerateNtmsObject>(enumerate()).await.unwrap();
    assert_eq!(media_list.list_size, 1);
    assert_eq!(media_list.list.elements, vec![media]);
}

#[tokio::test]
async fn test_derived_operation_rejected_on_base_client() {
    init_logging();

    let conn = LoopbackConn::new();
    register_server(conn.as_ref(), library_server(Library::new()).unwrap())
        .await
        .unwrap();

    // only the leaf syntax is served, so the base interface cannot bind
    let err = Client::connect(conn.clone(), &INTMS_OBJECT_MANAGEMENT1, ClientConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::NotBound(_)));

    let config = ClientConfig {
        bind_on_connect: false,
        ..ClientConfig::default()
    };
    let client = Client::connect(conn.clone(), &INTMS_OBJECT_MANAGEMENT1, config)
        .await
        .unwrap();
    assert!(matches!(client.call::<AddRef>(NoOutput).await, Err(RpcError::NotBound(_))));

    let err = client
        .call::<GetNtmsUIOptionsW>(UiOptionsRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RpcError::InterfaceNotInChain {
            interface: "INtmsObjectManagement1",
            operation: "GetNtmsUIOptionsW",
        }
    ));
    assert_eq!(conn.calls(), 0);
}

#[tokio::test]
async fn test_alter_context_switches_interface() {
    init_logging();

    let (conn, library, mut client) = library_client(&INTMS_OBJECT_MANAGEMENT3).await;
    library.add_object(Guid::from_u128(0xd41e), object_type::DRIVE);

    // no server for the base interface on its own yet
    let err = client.alter_context(&INTMS_OBJECT_MANAGEMENT1).await.unwrap_err();
    assert!(matches!(err, RpcError::NotBound(_)));
    assert_eq!(client.interface().name, "INtmsObjectManagement3");

    let standalone = Router::builder(&INTMS_OBJECT_MANAGEMENT1)
        .operation::<EnumerateNtmsObject, _>(|_req| {
            Ok(ResponseEnvelope::ok(EnumerateResponse {
                list_size: 0xFFFF,
                ..Default::default()
            }))
        })
        .build()
        .unwrap();
    register_server(conn.as_ref(), standalone).await.unwrap();

    client.alter_context(&INTMS_OBJECT_MANAGEMENT1).await.unwrap();
    assert_eq!(client.interface().name, "INtmsObjectManagement1");
    assert!(conn.is_bound(&INTMS_OBJECT_MANAGEMENT1.syntax));
    assert!(conn.is_bound(&INTMS_OBJECT_MANAGEMENT3.syntax));

    let request = EnumerateRequest {
        list_buffer_size: 4,
        object_type: object_type::DRIVE,
        ..Default::default()
    };
    let response = client.call::<EnumerateNtmsObject>(request.clone()).await.unwrap();
    assert_eq!(response.list_size, 0xFFFF);

    assert!(matches!(
        client.call::<GetNtmsObjectAttributeWR>(AttributeRequest::default()).await,
        Err(RpcError::InterfaceNotInChain { .. })
    ));

    client.alter_context(&INTMS_OBJECT_MANAGEMENT3).await.unwrap();
    let response = client.call::<EnumerateNtmsObject>(request).await.unwrap();
    assert_eq!(response.list_size, 1);
}

#[test]
fn test_router_rejects_foreign_base() {
    init_logging();

    let foreign = Router::builder(&IMID).build().unwrap();
    let err = Router::builder(&INTMS_OBJECT_MANAGEMENT2).base(foreign).build().unwrap_err();
    assert!(matches!(err, RpcError::InterfaceNotInChain { interface: "INtmsObjectManagement2", .. }));
}
