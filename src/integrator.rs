//! Per-vertex cloth update rule.
//!
//! On the device this rule runs inside the composite pass's vertex shader
//! (see [`shader`](crate::shader)). The functions here are the same rule
//! written against [`SimulationState`] so it can be stepped and checked
//! without a GPU. Each function matches one block of the WGSL.

use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::config::PhysicsConfig;
use crate::grid::Grid;
use crate::state::{SimulationState, StepViews};

/// Inputs of one integration step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegratorParams {
    /// Seconds since the previous frame.
    pub delta_time: f32,
    pub spinning_speed: f32,
    pub spring_strength: f32,
    pub gravity_strength: f32,
}

impl IntegratorParams {
    pub fn new(physics: &PhysicsConfig, delta_time: f32) -> Self {
        Self {
            delta_time,
            spinning_speed: physics.spinning_speed,
            spring_strength: physics.spring_strength,
            gravity_strength: physics.gravity_strength,
        }
    }
}

/// Rotate an anchor-ring position about the vertical axis by `angle`.
///
/// `x' = x cos a + z sin a`, `z' = z cos a - x sin a`; `y` and `w` are kept.
pub fn rotate_anchor(position: Vec4, angle: f32) -> Vec4 {
    let (sn, cs) = angle.sin_cos();
    Vec4::new(
        cs * position.x + sn * position.z,
        position.y,
        -sn * position.x + cs * position.z,
        position.w,
    )
}

/// Velocity correction pulling `a` towards the rest distance to `b`.
///
/// Directed along the current `a - b` delta, scaled by
/// `(wanted - actual) * delta_time * spring_strength`: a stretched spring
/// pulls `a` towards `b`, a compressed one pushes it away.
pub fn spring_correction(
    rest_a: Vec4,
    rest_b: Vec4,
    current_a: Vec3,
    current_b: Vec3,
    delta_time: f32,
    spring_strength: f32,
) -> Vec3 {
    let wanted_distance = (rest_a - rest_b).length();
    let diff = current_a - current_b;
    let delta_len = wanted_distance - diff.length();
    diff.normalize() * delta_len * delta_time * spring_strength
}

/// Smoothed surface normal at `(x, y)` from the triangle fans above and
/// below the vertex, each fan triangle normalized before averaging.
pub fn vertex_normal(grid: &Grid, current: &[Vec4], x: u32, y: u32) -> Vec3 {
    let at = |x: u32, y: u32| current[grid.index(x, y) as usize].xyz();
    let me = at(x, y);
    let left_x = (x + grid.row_length() - 1) % grid.row_length();
    let right_x = (x + 1) % grid.row_length();
    let to_left = at(left_x, y) - me;
    let to_right = at(right_x, y) - me;

    let mut normal = Vec3::ZERO;
    let mut triangles = 0;

    if y > 0 {
        let to_up = at(x, y - 1) - me;
        normal += to_up.cross(to_left).normalize();
        normal += to_right.cross(to_up).normalize();
        triangles += 2;
    }
    if y < grid.last_row() {
        let to_down = at(x, y + 1) - me;
        normal += to_left.cross(to_down).normalize();
        normal += to_down.cross(to_right).normalize();
        triangles += 2;
    }

    normal / triangles as f32
}

/// Advance a single vertex: writes `next[index]` and, for non-anchor rows,
/// `velocity[index]`.
pub fn integrate_vertex(grid: &Grid, views: &mut StepViews<'_>, x: u32, y: u32, params: &IntegratorParams) {
    let index = grid.index(x, y) as usize;
    let current = views.current[index];

    if y == 0 {
        views.next[index] = rotate_anchor(current, params.delta_time * params.spinning_speed);
        return;
    }

    let mut velocity = views.velocity[index];
    velocity.y -= params.gravity_strength * params.delta_time;

    for (other_x, other_y) in grid.neighbors(x, y) {
        let other = grid.index(other_x, other_y) as usize;
        let correction = spring_correction(
            views.rest[index],
            views.rest[other],
            current.xyz(),
            views.current[other].xyz(),
            params.delta_time,
            params.spring_strength,
        );
        velocity += correction.extend(0.0);
    }

    velocity.y /= 10.0;

    views.velocity[index] = velocity;
    views.next[index] = current + velocity * params.delta_time;
}

/// Run one frame of the rule over the whole triangle stream.
///
/// Only the invocation listed in `owners` mutates a vertex, exactly as on the
/// device. The caller swaps afterwards. Returns the number of vertices
/// written.
pub fn step(grid: &Grid, owners: &[u32], state: &mut SimulationState, params: &IntegratorParams) -> usize {
    debug_assert_eq!(owners.len(), state.vertex_count());
    let mut views = state.step_views();
    let mut written = 0;

    for stream_index in 0..grid.stream_len() {
        let r = grid.stream_ref(stream_index);
        let vertex = grid.index(r.x, r.y) as usize;
        if owners[vertex] != stream_index {
            continue;
        }
        integrate_vertex(grid, &mut views, r.x, r.y, params);
        written += 1;
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(delta_time: f32) -> IntegratorParams {
        IntegratorParams::new(&PhysicsConfig::default(), delta_time)
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let p = rotate_anchor(Vec4::new(1.0, 0.5, 0.0, 1.0), std::f32::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-6);
        assert!((p.z + 1.0).abs() < 1e-6);
        assert_eq!(p.y, 0.5);
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn test_spring_at_rest_length_is_zero() {
        let a = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let b = Vec4::new(0.3, 0.4, 0.0, 1.0);
        let correction = spring_correction(a, b, a.xyz(), b.xyz(), 0.016, 300.0);
        assert!(correction.length() < 1e-5);
    }

    #[test]
    fn test_compressed_spring_pushes_apart() {
        let rest_a = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let rest_b = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let correction = spring_correction(rest_a, rest_b, Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0), 1.0, 1.0);
        // a sits at the origin, b at +x: pushing apart means -x
        assert!((correction - Vec3::new(-0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_every_vertex_written_once() {
        let grid = Grid::new(6, 4);
        let owners = grid.owner_table();
        let mut state = SimulationState::from_rest_shape(&grid.rest_shape(0.4, 0.6));
        let written = step(&grid, &owners, &mut state, &params(0.01));
        assert_eq!(written, grid.vertex_count() as usize);
    }

    #[test]
    fn test_step_leaves_current_untouched() {
        let grid = Grid::new(6, 4);
        let owners = grid.owner_table();
        let rest = grid.rest_shape(0.4, 0.6);
        let mut state = SimulationState::from_rest_shape(&rest);
        step(&grid, &owners, &mut state, &params(0.02));

        assert_eq!(state.current(), rest.as_slice());
        assert_eq!(state.rest(), rest.as_slice());
        assert_ne!(state.next(), rest.as_slice());
    }

    #[test]
    fn test_anchor_velocity_untouched() {
        let grid = Grid::new(6, 4);
        let owners = grid.owner_table();
        let mut state = SimulationState::from_rest_shape(&grid.rest_shape(0.4, 0.6));
        step(&grid, &owners, &mut state, &params(0.02));

        for x in 0..grid.row_length() {
            assert_eq!(state.velocity()[grid.index(x, 0) as usize], Vec4::ZERO);
        }
    }

    #[test]
    fn test_rest_normals_point_outward() {
        let grid = Grid::new(60, 40);
        let rest = grid.rest_shape(0.4, 0.6);
        for y in 0..grid.column_length() {
            for x in 0..grid.row_length() {
                let normal = vertex_normal(&grid, &rest, x, y);
                let p = rest[grid.index(x, y) as usize];
                let radial = Vec3::new(p.x, 0.0, p.z).normalize();
                assert!(
                    normal.normalize().dot(radial) > 0.9,
                    "normal at ({x}, {y}) is {normal:?}"
                );
            }
        }
    }
}
