//! # Overlay Benchmark
//!
//! Render-phase cost of rebuilding overlay geometry from a full channel.
//!
//! Run with: `cargo bench --package volumina_rendering`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use volumina_core::{
    BackendDescriptor, DrawList, FrameContext, FrameTransforms, MemoryAssets, Overlay,
    PipelineConfig, ProcessRequest, Viewport,
};
use volumina_rendering::{
    GraphOverlay, OverlayHost, PathOverlay, SeriesStats, TenengradProcessor,
};

fn bench_graph_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_rebuild");
    for points in [20usize, 512, 4096] {
        let mut graph = GraphOverlay::with_capacity("graph", points).unwrap().shown();
        let mut list = DrawList::new();
        group.bench_with_input(BenchmarkId::from_parameter(points), &points, |b, &points| {
            b.iter(|| {
                for i in 0..points {
                    #[allow(clippy::cast_precision_loss)]
                    graph.add_point((i as f64).sin());
                }
                list.begin_frame();
                let mut frame = FrameContext::with_defaults(&mut list, Viewport::new(1920, 1080));
                black_box(graph.render_2d(&mut frame));
            });
        });
    }
    group.finish();
}

fn bench_path_redraw(c: &mut Criterion) {
    let mut path = PathOverlay::with_capacity("path", 512).unwrap().shown();
    for i in 0..512u16 {
        let t = f32::from(i) * 0.01;
        path.add_path_point(t.cos(), t.sin(), t);
    }
    let mut list = DrawList::new();

    c.bench_function("path_redraw_cached_512", |b| {
        b.iter(|| {
            list.begin_frame();
            let mut frame = FrameContext::with_defaults(&mut list, Viewport::new(1920, 1080));
            black_box(path.render_3d(&mut frame));
        });
    });
}

fn bench_host_frame(c: &mut Criterion) {
    let mut host = OverlayHost::new(PipelineConfig::default(), BackendDescriptor::compute("opencl"));
    for n in 0..8 {
        let graph = GraphOverlay::with_capacity(format!("graph_{n}"), 512).unwrap().shown();
        for i in 0..512u16 {
            graph.add_point(f64::from(i));
        }
        host.add_overlay(Box::new(graph));
    }
    host.init(MemoryAssets::new());

    c.bench_function("host_frame_8_graphs", |b| {
        b.iter(|| black_box(host.render_frame(FrameTransforms::default(), Viewport::new(1920, 1080))));
    });
}

fn bench_tenengrad(c: &mut Criterion) {
    let voxels: Vec<u8> = (0..256 * 256).map(|i: u32| (i % 251) as u8).collect();
    let processor = TenengradProcessor::new();
    let request = ProcessRequest::new(0, 256, 256, 1).with_voxels(&voxels);

    c.bench_function("tenengrad_256x256", |b| {
        b.iter(|| black_box(volumina_core::Processor::compute(&processor, &request)));
    });
}

fn bench_series_stats(c: &mut Criterion) {
    let values: Vec<f64> = (0..512).map(f64::from).collect();
    c.bench_function("series_stats_512", |b| {
        b.iter(|| black_box(SeriesStats::from_values(&values)));
    });
}

criterion_group!(
    benches,
    bench_graph_rebuild,
    bench_path_redraw,
    bench_host_frame,
    bench_tenengrad,
    bench_series_stats
);
criterion_main!(benches);
