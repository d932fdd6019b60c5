//! # drape - GPU spring-mass cloth
//!
//! A cylinder of cloth hangs from a spinning ring above a ground plane and
//! casts a shadow onto it. The spring-mass simulation runs on the GPU as a
//! side effect of drawing the cloth: the vertex shader of the on-screen
//! cloth draw advances every vertex into a second position buffer, and the
//! two buffers swap roles once per frame.
//!
//! ## Quick Start
//!
//! ```ignore
//! use drape::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     drape::run(
//!         ClothConfig::default()
//!             .with_spring_strength(200.0)
//!             .with_max_delta_time(1.0 / 30.0),
//!     )
//! }
//! ```
//!
//! ## Frame
//!
//! 1. **Shadow pass**: the cloth drawn from the light into an off-screen depth
//!    and color target. Reads the current positions only.
//! 2. **Composite pass**: the cloth drawn from the viewer. The owning
//!    invocation of every vertex integrates it into the next buffer.
//! 3. **Swap**: next becomes current.
//! 4. **Ground**: the floor samples the shadow targets, either as a
//!    depth-compared shadow or as the flat color the light saw.
//!
//! Press `C` to switch between the two ground modes.
//!
//! ## Topology
//!
//! The cloth is drawn as a plain triangle stream with no vertex buffer. Each
//! stream index decodes to a grid vertex, and several stream indices share
//! one vertex. [`Grid::owner_table`] picks exactly one of them to write that
//! vertex, so the parallel update has a single writer per vertex.
//!
//! The [`integrator`] module carries the same per-vertex rule on the CPU for
//! testing; it is never part of a rendered frame.

pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod integrator;
pub mod shader;
pub mod state;
pub mod time;

pub use app::{run, ClothApp};
pub use config::{ClothConfig, PhysicsConfig};
pub use display::DisplayMode;
pub use error::{AppError, GpuError};
pub use glam::{Vec2, Vec3, Vec4};
pub use grid::Grid;
pub use integrator::IntegratorParams;
pub use state::{PingPong, SimulationState};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use drape::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::{run, ClothApp};
    pub use crate::config::{ClothConfig, PhysicsConfig};
    pub use crate::display::DisplayMode;
    pub use crate::error::{AppError, GpuError};
    pub use crate::grid::Grid;
    pub use crate::time::FrameClock;
    pub use crate::{Vec2, Vec3, Vec4};
}
