use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hdrfry_core::{ImageBuf, ParameterSet, Pipeline, Preset};

fn gradient(width: u32, height: u32) -> ImageBuf {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            data.push(255.0 * fx);
            data.push(255.0 * fy);
            data.push(255.0 * (fx + fy) / 2.0);
        }
    }
    ImageBuf {
        width,
        height,
        data,
    }
}

/// Preview-sized runs of every preset, the interactive hot path.
fn bench_presets(c: &mut Criterion) {
    let pipeline = Pipeline::new();
    let input = gradient(600, 400);
    let mut group = c.benchmark_group("preview_presets");
    group.throughput(Throughput::Elements(600 * 400));

    for preset in Preset::ALL {
        let params = preset.params();
        group.bench_with_input(BenchmarkId::from_parameter(preset), &params, |b, params| {
            b.iter(|| {
                pipeline
                    .process_cpu(black_box(input.clone()), black_box(params), 7)
                    .ok()
            });
        });
    }
    group.finish();
}

fn bench_bloom_sizes(c: &mut Criterion) {
    let pipeline = Pipeline::new();
    let params = ParameterSet::default().with(hdrfry_core::Knob::Bloom, 20.0);
    let mut group = c.benchmark_group("bloom");

    for size in [256u32, 600, 1200] {
        let input = gradient(size, size);
        group.throughput(Throughput::Elements(size as u64 * size as u64));
        group.bench_with_input(
            BenchmarkId::new("bloom", format!("{size}x{size}")),
            &input,
            |b, input| {
                b.iter(|| pipeline.process_cpu(black_box(input.clone()), &params, 0).ok());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_presets, bench_bloom_sizes);
criterion_main!(benches);
