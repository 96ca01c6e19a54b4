use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec3;
use kerf_stock::{GridConfig, VoxelGrid};
use kerf_tool::{Bit, ToolShape};

fn bench_remove_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_intersection");

    for resolution in [0.05, 0.02, 0.01] {
        let config = GridConfig::new(DVec3::ZERO, DVec3::new(4.0, 2.0, 4.0), resolution);
        let mut bit = Bit::from_shape(&ToolShape::BallMill {
            length: 10.0,
            radius: 0.5,
        });

        group.bench_with_input(
            BenchmarkId::new("ball_pass", format!("{resolution}")),
            &config,
            |b, config| {
                b.iter_batched(
                    || VoxelGrid::new(*config).expect("valid bench grid"),
                    |mut grid| {
                        for step in 0..100 {
                            let x = 0.2 + f64::from(step) * 0.036;
                            bit.set_pose(DVec3::new(x, 1.5, 2.0), 0.0);
                            black_box(grid.remove_intersection(&bit));
                        }
                        grid
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_marching_cubes(c: &mut Criterion) {
    let config = GridConfig::new(DVec3::ZERO, DVec3::splat(2.0), 0.02);
    c.bench_function("marching_cubes_full", |b| {
        b.iter_batched(
            || {
                let mut grid = VoxelGrid::new(config).expect("valid bench grid");
                grid.mark_all_dirty();
                grid
            },
            |mut grid| black_box(grid.marching_cubes()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_remove_intersection, bench_marching_cubes);
criterion_main!(benches);
