//! Benchmark for painter filters and full manipulator runs.
//!
//! Run with: cargo bench --package flatland_procedural --bench painter_benchmark

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use flatland_core::material::STONE;
use flatland_core::Flat;
use flatland_procedural::{ManipulatorRegistry, Painter, Params, Region};

fn hex_sized_flat() -> Flat {
    let mut flat = Flat::new("bench", "ground", "f", 100, 100);
    flat.ocean_level = 40;
    for z in 0..100 {
        for x in 0..100 {
            flat.set_column(x, z, STONE);
            flat.set_level(x, z, ((x * 7 + z * 13) % 90) as u8);
        }
    }
    flat
}

fn benchmark_soften(c: &mut Criterion) {
    let mut group = c.benchmark_group("painter");
    group.throughput(Throughput::Elements(100 * 100));

    group.bench_function("soften_radius_2", |b| {
        b.iter_batched(
            hex_sized_flat,
            |mut flat| {
                let region = Region::whole(&flat);
                Painter::new(&mut flat, region).soften(0, 0, 99, 99, 0.7, 2);
                black_box(flat)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("fill_circle_r40", |b| {
        b.iter_batched(
            hex_sized_flat,
            |mut flat| {
                let region = Region::whole(&flat);
                Painter::new(&mut flat, region).fill_circle(50, 50, 40.0, 80);
                black_box(flat)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_manipulators(c: &mut Criterion) {
    let registry = ManipulatorRegistry::with_defaults();
    let mut group = c.benchmark_group("manipulators");
    group.sample_size(20);

    for (name, params) in [
        ("hilly", Params::new().with("seed", 1)),
        ("mountain", Params::new().with("seed", 1)),
        ("islands", Params::new().with("seed", 1)),
        ("composition", Params::new().with("preset", "volcanic-island").with("islands.seed", 1)),
    ] {
        group.bench_function(name, |b| {
            b.iter_batched(
                hex_sized_flat,
                |mut flat| {
                    let region = Region::whole(&flat);
                    black_box(registry.execute(name, &mut flat, region, &params).is_ok())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_soften, benchmark_manipulators);
criterion_main!(benches);
