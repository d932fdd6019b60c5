//! Benchmarks for the CPU-side cloth operations.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use drape::integrator::{self, IntegratorParams};
use drape::{shader, Grid, PhysicsConfig, SimulationState};

const GRID_SIZES: [(u32, u32); 3] = [(30, 20), (60, 40), (120, 80)];

fn bench_owner_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("owner_table");

    for (row_length, column_length) in GRID_SIZES {
        let grid = Grid::new(row_length, column_length);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{row_length}x{column_length}")),
            &grid,
            |b, grid| b.iter(|| black_box(grid.owner_table())),
        );
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");
    let params = IntegratorParams::new(&PhysicsConfig::default(), 1.0 / 60.0);

    for (row_length, column_length) in GRID_SIZES {
        let grid = Grid::new(row_length, column_length);
        let owners = grid.owner_table();
        let mut state = SimulationState::from_rest_shape(&grid.rest_shape(0.4, 0.6));

        group.bench_function(BenchmarkId::from_parameter(format!("{row_length}x{column_length}")), |b| {
            b.iter(|| {
                integrator::step(&grid, &owners, &mut state, &params);
                state.swap();
            })
        });
    }

    group.finish();
}

fn bench_shader_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("shader_generation");
    let grid = Grid::new(60, 40);

    group.bench_function("shadow", |b| b.iter(|| black_box(shader::shadow_shader(&grid))));
    group.bench_function("composite", |b| b.iter(|| black_box(shader::composite_shader(&grid))));
    group.bench_function("ground", |b| b.iter(|| black_box(shader::ground_shader())));

    group.finish();
}

criterion_group!(benches, bench_owner_table, bench_step, bench_shader_generation);
criterion_main!(benches);
