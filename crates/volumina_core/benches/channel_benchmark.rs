//! # Channel Benchmark
//!
//! Producer appends against render-side snapshots.
//!
//! Run with: `cargo bench --package volumina_core`

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use volumina_core::{BoundedChannel, Processor, ProcessorCore, ProcessRequest, FrameProcessor};
use volumina_core::{BackendDescriptor, OverlayResult, Toggleable};

struct Counter {
    core: ProcessorCore<f64>,
}

impl Toggleable for Counter {
    fn toggle(&self) -> bool {
        self.core.toggle()
    }
}

impl Processor for Counter {
    type Output = f64;

    fn core(&self) -> &ProcessorCore<f64> {
        &self.core
    }

    fn is_compatible_processor(&self, _backend: &BackendDescriptor) -> bool {
        true
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, request: &ProcessRequest<'_>) -> OverlayResult<Option<f64>> {
        Ok(Some(request.layer_index as f64))
    }
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_append");
    for capacity in [16usize, 512, 4096] {
        let channel = BoundedChannel::with_capacity(capacity).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            let mut i = 0.0f64;
            b.iter(|| {
                i += 1.0;
                channel.append(black_box(i));
            });
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let channel = BoundedChannel::with_capacity(512).unwrap();
    channel.extend((0..512).map(f64::from));

    c.bench_function("channel_try_take_snapshot_512", |b| {
        b.iter(|| black_box(channel.try_take_snapshot(Duration::from_millis(10))));
    });
}

fn bench_fan_out(c: &mut Criterion) {
    let processor = Counter {
        core: ProcessorCore::new("counter"),
    };
    let channels: Vec<Arc<BoundedChannel<f64>>> = (0..4)
        .map(|_| Arc::new(BoundedChannel::with_capacity(512).unwrap()))
        .collect();
    for channel in &channels {
        processor.add_result_listener(channel);
    }

    let request = ProcessRequest::new(3, 64, 64, 64);
    c.bench_function("process_fan_out_4_listeners", |b| {
        b.iter(|| black_box(processor.process(&request)));
    });
}

criterion_group!(benches, bench_append, bench_snapshot, bench_fan_out);
criterion_main!(benches);
