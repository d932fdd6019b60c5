//! Build-time configuration for the cloth scene.
//!
//! Every knob lives here with its default. There is no runtime configuration
//! surface: the binary builds a [`ClothConfig`] once and hands it to
//! [`run`](crate::run).
//!
//! ```ignore
//! let config = ClothConfig::default()
//!     .with_grid(30, 20)
//!     .with_spring_strength(150.0);
//! drape::run(config)?;
//! ```

use glam::Vec3;

use crate::grid::Grid;

/// Vertices per ring (around the cylinder).
pub const ROW_LENGTH: u32 = 60;
/// Number of rings from top to bottom.
pub const COLUMN_LENGTH: u32 = 40;
/// Radius of the top (anchor) ring.
pub const UPPER_RADIUS: f32 = 0.4;
/// Radius of the bottom ring.
pub const LOWER_RADIUS: f32 = 0.6;
/// Side length of the square shadow target in texels.
pub const SHADOW_MAP_SIZE: u32 = 2000;

/// Physics parameters consumed by the integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Angular speed of the anchor ring in radians per second.
    pub spinning_speed: f32,
    /// Hookean stiffness of every spring.
    pub spring_strength: f32,
    /// Downward acceleration applied to non-anchor vertices.
    pub gravity_strength: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            spinning_speed: 0.5,
            spring_strength: 300.0,
            gravity_strength: 0.01,
        }
    }
}

/// Complete scene configuration.
#[derive(Clone, Debug)]
pub struct ClothConfig {
    pub row_length: u32,
    pub column_length: u32,
    pub upper_radius: f32,
    pub lower_radius: f32,
    pub shadow_map_size: u32,
    /// Position the shadow camera looks from, towards the origin.
    pub light_position: Vec3,
    /// Direction used for diffuse shading of the cloth.
    pub shading_light_dir: Vec3,
    /// Alpha written by the cloth fragment shader.
    pub cloth_alpha: f32,
    pub physics: PhysicsConfig,
    /// Upper bound on a single frame's delta time. `None` passes wall-clock
    /// deltas through untouched, stalls included.
    pub max_delta_time: Option<f32>,
    pub window_title: String,
    pub window_size: (u32, u32),
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            row_length: ROW_LENGTH,
            column_length: COLUMN_LENGTH,
            upper_radius: UPPER_RADIUS,
            lower_radius: LOWER_RADIUS,
            shadow_map_size: SHADOW_MAP_SIZE,
            light_position: Vec3::new(0.0, 3.0, 0.0),
            shading_light_dir: Vec3::new(1.0, 0.0, 1.0),
            cloth_alpha: 0.6,
            physics: PhysicsConfig::default(),
            max_delta_time: None,
            window_title: "drape".to_string(),
            window_size: (800, 600),
        }
    }
}

impl ClothConfig {
    /// Set the lattice dimensions.
    pub fn with_grid(mut self, row_length: u32, column_length: u32) -> Self {
        self.row_length = row_length;
        self.column_length = column_length;
        self
    }

    /// Set the top and bottom ring radii.
    pub fn with_radii(mut self, upper: f32, lower: f32) -> Self {
        self.upper_radius = upper;
        self.lower_radius = lower;
        self
    }

    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    pub fn with_light_position(mut self, position: Vec3) -> Self {
        self.light_position = position;
        self
    }

    pub fn with_spinning_speed(mut self, speed: f32) -> Self {
        self.physics.spinning_speed = speed;
        self
    }

    pub fn with_spring_strength(mut self, strength: f32) -> Self {
        self.physics.spring_strength = strength;
        self
    }

    pub fn with_gravity_strength(mut self, strength: f32) -> Self {
        self.physics.gravity_strength = strength;
        self
    }

    /// Clamp every frame's delta time to `max` seconds.
    pub fn with_max_delta_time(mut self, max: f32) -> Self {
        self.max_delta_time = Some(max);
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// The lattice described by this configuration.
    pub fn grid(&self) -> Grid {
        Grid::new(self.row_length, self.column_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scene_constants() {
        let config = ClothConfig::default();
        assert_eq!(config.row_length, 60);
        assert_eq!(config.column_length, 40);
        assert_eq!(config.shadow_map_size, 2000);
        assert_eq!(config.physics.spring_strength, 300.0);
        assert!(config.max_delta_time.is_none());
        assert_eq!(config.grid().vertex_count(), 2400);
    }

    #[test]
    fn test_builder_chains() {
        let config = ClothConfig::default()
            .with_grid(8, 4)
            .with_radii(1.0, 1.0)
            .with_spring_strength(0.0)
            .with_max_delta_time(0.05);

        assert_eq!(config.grid().vertex_count(), 32);
        assert_eq!(config.upper_radius, 1.0);
        assert_eq!(config.physics.spring_strength, 0.0);
        assert_eq!(config.max_delta_time, Some(0.05));
        // Untouched fields keep their defaults
        assert_eq!(config.physics.gravity_strength, 0.01);
    }
}
