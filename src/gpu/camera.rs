//! Viewer and light projections.

use glam::{Mat4, Vec3, Vec4};

/// Orbit-style viewer camera, fixed for the cloth scene.
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Three units back, tilted 0.4 rad down onto the cloth.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.4,
            distance: 3.0,
            target: Vec3::ZERO,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Orthographic projection of the shadow camera at `light_position`,
/// looking at the origin with +Z as up.
///
/// Covers `[-1, 1]²` around the origin and depths `0..5` from the light.
pub fn light_projection(light_position: Vec3) -> Mat4 {
    let projection = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 5.0);
    let view = Mat4::look_at_rh(light_position, Vec3::ZERO, Vec3::Z);
    projection * view
}

/// Texture coordinates and depth of `world` in a light's shadow target, the
/// same mapping the ground shader applies.
pub fn shadow_coords(light_proj: Mat4, world: Vec3) -> Vec3 {
    let clip = light_proj * Vec4::new(world.x, world.y, world.z, 1.0);
    let ndc = clip.truncate() / clip.w;
    Vec3::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, ndc.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position() {
        let camera = Camera::new();
        let p = camera.position();
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 3.0 * 0.4f32.sin()).abs() < 1e-5);
        assert!((p.z - 3.0 * 0.4f32.cos()).abs() < 1e-5);
        assert!((p.length() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_origin_in_front_of_viewer() {
        let camera = Camera::new();
        let clip = camera.view_projection(4.0 / 3.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_light_depths() {
        let light = light_projection(Vec3::new(0.0, 3.0, 0.0));

        let origin = shadow_coords(light, Vec3::ZERO);
        assert!((origin.x - 0.5).abs() < 1e-5);
        assert!((origin.y - 0.5).abs() < 1e-5);
        assert!((origin.z - 0.6).abs() < 1e-5);

        // The ground is further from the light than the cloth
        let floor = shadow_coords(light, Vec3::new(0.0, -1.0, 0.0));
        assert!((floor.z - 0.8).abs() < 1e-5);
    }
}
