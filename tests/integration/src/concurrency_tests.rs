//! Concurrency Tests
//!
//! Many callers on one association:
//! - Routers and handler state are shared across tasks
//! - Every call gets its own causality ID
//! - Faulting calls do not disturb concurrent successful ones

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use common::rsm::*;
use common::*;
use futures::future::join_all;
use msrpc::ndr::Guid;
use msrpc::status::hresult;
use msrpc::{
    register_server, Client, ClientConfig, InterfaceDescriptor, Operation, ResponseEnvelope, Router, RpcError,
    SyntaxId,
};
use parking_lot::Mutex;
use tokio::sync::Barrier;

const ITRACKER: InterfaceDescriptor = InterfaceDescriptor::new(
    "ITracker",
    SyntaxId::new(Guid::from_u128(0x7eac_0000_0000_4000_8000_0000_0000_0001), 1, 0),
    None,
    &["Record"],
);

struct Record;

impl Operation for Record {
    type Request = u32;
    type Response = u32;
    const INTERFACE: &'static InterfaceDescriptor = &ITRACKER;
    const OPNUM: u16 = 0;
    const NAME: &'static str = "Record";
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_clients_one_association() {
    init_logging();

    const NUM_CLIENTS: usize = 32;
    const REQUESTS_PER_CLIENT: usize = 50;

    let library = Library::new();
    library.add_object(Guid::from_u128(0xd41e), object_type::DRIVE);
    let conn = LoopbackConn::new();
    register_server(conn.as_ref(), library_server(library).unwrap())
        .await
        .unwrap();

    let barrier = Arc::new(Barrier::new(NUM_CLIENTS));
    let start = Instant::now();
    let handles: Vec<_> = (0..NUM_CLIENTS)
        .map(|_| {
            let conn = conn.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                let client = Client::connect(conn, &INTMS_OBJECT_MANAGEMENT3, ClientConfig::default()).await?;
                barrier.wait().await;
                for _ in 0..REQUESTS_PER_CLIENT {
                    client.call::<AddRef>(NoOutput).await?;
                    let drives = client
                        .call::<EnumerateNtmsObject>(EnumerateRequest {
                            list_buffer_size: 4,
                            object_type: object_type::DRIVE,
                            ..Default::default()
                        })
                        .await?;
                    assert_eq!(drives.list_size, 1);
                }
                Ok::<_, RpcError>(())
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }
    println!(
        "{} calls in {:?}",
        NUM_CLIENTS * REQUESTS_PER_CLIENT * 2,
        start.elapsed()
    );

    // reference count starts at one and every AddRef landed exactly once
    let client = Client::connect(conn.clone(), &INTMS_OBJECT_MANAGEMENT3, ClientConfig::default())
        .await
        .unwrap();
    let count = client.call::<AddRef>(NoOutput).await.unwrap();
    assert_eq!(count as usize, 1 + NUM_CLIENTS * REQUESTS_PER_CLIENT + 1);
    assert_eq!(conn.calls(), NUM_CLIENTS * REQUESTS_PER_CLIENT * 2 + 1);
    assert!(conn.faults().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_client_fresh_causality_per_call() {
    init_logging();

    const NUM_TASKS: usize = 16;
    const CALLS_PER_TASK: usize = 25;

    let seen = Arc::new(Mutex::new(HashSet::new()));
    let recorder = seen.clone();
    let router = Router::builder(&ITRACKER)
        .operation::<Record, _>(move |req| {
            recorder.lock().insert(req.this.cid);
            Ok(ResponseEnvelope::ok(req.body))
        })
        .build()
        .unwrap();

    let conn = LoopbackConn::new();
    register_server(conn.as_ref(), router).await.unwrap();
    let client = Arc::new(
        Client::connect(conn.clone(), &ITRACKER, ClientConfig::default())
            .await
            .unwrap(),
    );

    let handles: Vec<_> = (0..NUM_TASKS)
        .map(|task| {
            let client = client.clone();
            tokio::spawn(async move {
                for n in 0..CALLS_PER_TASK {
                    let value = (task * CALLS_PER_TASK + n) as u32;
                    assert_eq!(client.call::<Record>(value).await.unwrap(), value);
                }
            })
        })
        .collect();
    for result in join_all(handles).await {
        result.unwrap();
    }

    let seen = seen.lock();
    assert_eq!(seen.len(), NUM_TASKS * CALLS_PER_TASK);
    assert!(!seen.contains(&Guid::NIL));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_faults_isolated_under_load() {
    init_logging();

    const ROUNDS: usize = 40;

    let library = Library::new();
    let media = Guid::from_u128(0x3ed1);
    library.add_object(media, object_type::PHYSICAL_MEDIA);
    let conn = LoopbackConn::new();
    register_server(conn.as_ref(), library_server(library).unwrap())
        .await
        .unwrap();
    let client = Arc::new(
        Client::connect(conn.clone(), &INTMS_OBJECT_MANAGEMENT3, ClientConfig::default())
            .await
            .unwrap(),
    );

    let target = ObjectRef {
        object_id: media,
        object_type: object_type::PHYSICAL_MEDIA,
    };
    let handles: Vec<_> = (0..ROUNDS)
        .map(|round| {
            let client = client.clone();
            let target = target.clone();
            tokio::spawn(async move {
                if round % 2 == 0 {
                    client.call::<DisableNtmsObject>(target).await.map(|_| ())
                } else {
                    client.call::<EnableNtmsObject>(target).await.map(|_| ())
                }
            })
        })
        .collect();

    let mut unimplemented = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(()) => {}
            Err(RpcError::UnimplementedOperation { opnum: 10, .. }) => unimplemented += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(unimplemented, ROUNDS / 2);
    let faults = conn.faults();
    assert_eq!(faults.len(), ROUNDS / 2);
    assert!(faults.iter().all(|status| *status == hresult::E_NOTIMPL));
    assert_eq!(conn.calls(), ROUNDS);
}
