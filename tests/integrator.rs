//! Integration tests for the per-vertex update rule.
//!
//! These drive the CPU form of the rule through whole frames the way the
//! renderer drives the shader: step into next, then swap.

use drape::integrator::{self, spring_correction, IntegratorParams};
use drape::{Grid, PhysicsConfig, SimulationState, Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

fn rest_state(grid: &Grid) -> SimulationState {
    SimulationState::from_rest_shape(&grid.rest_shape(0.4, 0.6))
}

fn frame(grid: &Grid, owners: &[u32], state: &mut SimulationState, params: &IntegratorParams) {
    integrator::step(grid, owners, state, params);
    state.swap();
}

// ============================================================================
// Forces
// ============================================================================

#[test]
fn test_gravity_only_step() {
    let grid = Grid::new(12, 8);
    let owners = grid.owner_table();
    let mut state = rest_state(&grid);

    let physics = PhysicsConfig {
        spring_strength: 0.0,
        ..PhysicsConfig::default()
    };
    let dt = 0.02;
    let params = IntegratorParams::new(&physics, dt);
    integrator::step(&grid, &owners, &mut state, &params);

    let expected_vy = (0.0 - physics.gravity_strength * dt) / 10.0;
    for y in 1..grid.column_length() {
        for x in 0..grid.row_length() {
            let index = grid.index(x, y) as usize;
            let before = state.current()[index];
            let after = state.next()[index];
            assert_eq!(after.x, before.x);
            assert_eq!(after.z, before.z);
            assert!((after.y - (before.y + expected_vy * dt)).abs() <= f32::EPSILON);
            assert!((state.velocity()[index].y - expected_vy).abs() <= f32::EPSILON);
        }
    }
}

#[test]
fn test_single_spring_pair() {
    let rest_a = Vec4::new(0.0, 0.0, 0.0, 1.0);
    let rest_b = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let current_a = Vec3::ZERO;
    let current_b = Vec3::new(2.0, 0.0, 0.0);

    let correction = spring_correction(rest_a, rest_b, current_a, current_b, 1.0, 1.0);

    assert!((correction.length() - 1.0).abs() < 1e-6);
    // Stretched: pulled towards b
    assert!(correction.dot(current_b - current_a) > 0.0);
}

// ============================================================================
// Anchor ring
// ============================================================================

#[test]
fn test_anchor_radius_preserved() {
    let grid = Grid::new(16, 6);
    let owners = grid.owner_table();
    let mut state = rest_state(&grid);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let params = IntegratorParams::new(&PhysicsConfig::default(), rng.gen_range(0.0..0.5));
        frame(&grid, &owners, &mut state, &params);

        for x in 0..grid.row_length() {
            let p = state.current()[grid.index(x, 0) as usize];
            let radius = (p.x * p.x + p.z * p.z).sqrt();
            assert!((radius - 0.4).abs() < 1e-4, "anchor {x} drifted to radius {radius}");
            assert_eq!(p.y, 0.5);
        }
    }
}

// ============================================================================
// Whole frames
// ============================================================================

#[test]
fn test_swap_alternates_roles() {
    let grid = Grid::new(4, 3);
    let owners = grid.owner_table();
    let mut state = rest_state(&grid);
    let params = IntegratorParams::new(&PhysicsConfig::default(), 0.01);

    for n in 0..6 {
        assert_eq!(state.current_index(), n % 2);
        frame(&grid, &owners, &mut state, &params);
    }
}

#[test]
fn test_zero_delta_keeps_positions() {
    let grid = Grid::new(4, 3);
    let owners = grid.owner_table();
    let rest = grid.rest_shape(0.4, 0.6);
    let mut state = SimulationState::from_rest_shape(&rest);
    let params = IntegratorParams::new(&PhysicsConfig::default(), 0.0);

    for _ in 0..3 {
        frame(&grid, &owners, &mut state, &params);
        assert_eq!(state.current(), rest.as_slice());
    }
}

#[test]
fn test_bounded_delta_stays_finite() {
    let grid = Grid::new(60, 40);
    let owners = grid.owner_table();
    let mut state = rest_state(&grid);
    let params = IntegratorParams::new(&PhysicsConfig::default(), 1.0 / 60.0);

    for _ in 0..120 {
        frame(&grid, &owners, &mut state, &params);
    }

    for p in state.current() {
        assert!(p.is_finite());
        assert!(p.truncate().length() < 10.0);
        assert_eq!(p.w, 1.0);
    }
}
