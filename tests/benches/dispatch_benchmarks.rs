//! # Dispatch Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | qc-rpc-dispatch | Unary echo round trip, sequential and concurrent |
//! | qc-12 Ordering Gate | Proposal fan-out to N subscribers |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_12_ordering_gate::{OrderingGate, OrderingGateService};
use qc_rpc_dispatch::{handler_fn, DispatchConfig, Dispatcher, MethodDescriptor, Status};
use serde::{Deserialize, Serialize};
use shared_types::Proposal;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ping {
    seq: u64,
    body: Vec<u8>,
}

const ECHO: MethodDescriptor<Ping, Ping> = MethodDescriptor::new("bench.Echo");

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn echo_dispatcher(rt: &Runtime, worker_count: usize) -> Arc<Dispatcher> {
    let dispatcher = Arc::new(Dispatcher::new(DispatchConfig {
        worker_count,
        ..DispatchConfig::default()
    }));
    dispatcher
        .register_method(ECHO, handler_fn(|ping: Ping| async move { Ok::<_, Status>(ping) }))
        .expect("register echo");
    rt.spawn(Arc::clone(&dispatcher).run());
    dispatcher
}

// ============================================================================
// DISPATCHER
// ============================================================================

fn bench_unary_echo(c: &mut Criterion) {
    let rt = runtime();
    let dispatcher = echo_dispatcher(&rt, 4);
    let client = dispatcher.client();

    let mut group = c.benchmark_group("qc-rpc-dispatch");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("echo_sequential", |b| {
        let ping = Ping {
            seq: 1,
            body: vec![0u8; 64],
        };
        b.iter(|| {
            rt.block_on(async { black_box(client.call(&ECHO, &ping).await.is_ok()) })
        })
    });

    for concurrency in [8u64, 64, 256] {
        group.throughput(Throughput::Elements(concurrency));
        group.bench_with_input(
            BenchmarkId::new("echo_concurrent", concurrency),
            &concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    rt.block_on(async {
                        let calls: Vec<_> = (0..concurrency)
                            .map(|seq| {
                                let client = client.clone();
                                tokio::spawn(async move {
                                    let ping = Ping {
                                        seq,
                                        body: vec![0u8; 64],
                                    };
                                    client.call(&ECHO, &ping).await.is_ok()
                                })
                            })
                            .collect();
                        for call in calls {
                            black_box(call.await.unwrap_or(false));
                        }
                    })
                })
            },
        );
    }

    group.finish();
    dispatcher.shutdown();
}

// ============================================================================
// QC-12: Ordering Gate
// ============================================================================

fn bench_proposal_fan_out(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("qc-12-ordering-gate");

    for subscribers in [1usize, 4, 16] {
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("publish_proposal", subscribers),
            &subscribers,
            |b, &subscribers| {
                let gate = OrderingGateService::new();
                let mut streams: Vec<_> = (0..subscribers).map(|_| gate.on_proposal()).collect();
                let mut height = 0u64;
                b.iter(|| {
                    height += 1;
                    rt.block_on(async {
                        let delivered = gate.publish_proposal(Proposal::new(height, vec![], 0)).await;
                        for stream in streams.iter_mut() {
                            black_box(stream.next_proposal().await);
                        }
                        black_box(delivered)
                    })
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_unary_echo, bench_proposal_fan_out);
criterion_main!(benches);
