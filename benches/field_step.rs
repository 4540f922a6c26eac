//! Benchmarks for the CPU-side field update.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;

use particle_backdrop::headless::HeadlessHost;
use particle_backdrop::{BackdropConfig, Palette, ParticleBackdrop, ParticleField, SpawnContext};

fn bench_field_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_advance");
    let palette = Palette::default();

    for count in [1_000usize, 5_000, 20_000] {
        let mut ctx = SpawnContext::seeded(1);
        let mut field = ParticleField::initialize(count, &palette, &mut ctx);
        let mut t = 0.0f32;

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                t += 1.0 / 60.0;
                field.advance(black_box(Vec2::new(0.2, -0.4)), t);
            })
        });
    }

    group.finish();
}

fn bench_field_initialize(c: &mut Criterion) {
    let palette = Palette::default();
    c.bench_function("field_initialize_5000", |b| {
        b.iter(|| {
            let mut ctx = SpawnContext::seeded(1);
            black_box(ParticleField::initialize(5_000, &palette, &mut ctx))
        })
    });
}

fn bench_headless_frame(c: &mut Criterion) {
    let mut host = HeadlessHost::new(1280, 720);
    let mut backdrop = ParticleBackdrop::new(BackdropConfig {
        seed: Some(1),
        ..Default::default()
    });
    backdrop.mount(Some(&mut host));
    let mut t = 0.0f32;

    c.bench_function("headless_frame_5000", |b| {
        b.iter(|| {
            t += 1.0 / 60.0;
            host.move_pointer(640.0, 360.0);
            if let Some(id) = host.take_due_frame() {
                backdrop.on_frame_at(&mut host, id, t);
            }
        })
    });
}

criterion_group!(
    benches,
    bench_field_advance,
    bench_field_initialize,
    bench_headless_frame
);
criterion_main!(benches);
