//! Device setup and the per-frame render sequence.
//!
//! One frame is one command encoder: the shadow pass reads the current
//! position slot, the composite pass draws the cloth (advancing the
//! simulation into the next slot), swaps, and draws the ground. Pass order
//! inside the encoder separates the shadow pass's reads from the composite
//! pass's writes.

pub mod buffers;
pub mod camera;
pub mod composite;
pub mod shadow;

use std::sync::Arc;

use glam::{Mat4, Vec3};
use winit::window::Window;

pub use buffers::StateBuffers;
pub use camera::Camera;
pub use composite::CompositePass;
pub use shadow::ShadowPass;

use crate::config::{ClothConfig, PhysicsConfig};
use crate::display::DisplayMode;
use crate::error::GpuError;
use crate::integrator::IntegratorParams;
use crate::shader::{ClothUniforms, GroundUniforms};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device features the mutating cloth draw depends on.
pub const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::VERTEX_WRITABLE_STORAGE;

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Vertex-stage storage buffer.
pub(crate) fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Run `build` inside a validation error scope. A captured error becomes
/// [`GpuError::ShaderValidation`] carrying `name`.
async fn validated<T>(device: &wgpu::Device, name: &str, build: impl FnOnce() -> T) -> Result<T, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match device.pop_error_scope().await {
        Some(error) => {
            log::error!("{} failed validation", name);
            Err(GpuError::ShaderValidation {
                name: name.to_string(),
                message: error.to_string(),
            })
        }
        None => Ok(value),
    }
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    buffers: StateBuffers,
    shadow: ShadowPass,
    composite: CompositePass,
    pub camera: Camera,
    light_proj: Mat4,
    light_dir: Vec3,
    cloth_alpha: f32,
    physics: PhysicsConfig,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, config: &ClothConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let missing = REQUIRED_FEATURES.difference(adapter.features());
        if !missing.is_empty() {
            return Err(GpuError::MissingFeatures(missing));
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: REQUIRED_FEATURES,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            log::error!("Uncaptured wgpu error: {}", error);
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_texture = create_depth_texture(&device, &surface_config);

        let grid = config.grid();
        let rest_shape = grid.rest_shape(config.upper_radius, config.lower_radius);
        log::debug!(
            "Cloth grid {}x{}: {} vertices, {} stream references",
            grid.row_length(),
            grid.column_length(),
            grid.vertex_count(),
            grid.stream_len()
        );

        let buffers = StateBuffers::new(&device, &grid, &rest_shape);
        let shadow = validated(&device, "shadow pass", || {
            ShadowPass::new(&device, &grid, &buffers, config.shadow_map_size)
        })
        .await?;
        let composite = validated(&device, "composite pass", || {
            CompositePass::new(&device, &grid, &buffers, &shadow, surface_format)
        })
        .await?;

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            depth_texture,
            buffers,
            shadow,
            composite,
            camera: Camera::new(),
            light_proj: camera::light_projection(config.light_position),
            light_dir: config.shading_light_dir,
            cloth_alpha: config.cloth_alpha,
            physics: config.physics,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        self.resize(winit::dpi::PhysicalSize {
            width: self.config.width,
            height: self.config.height,
        });
    }

    fn update_uniforms(&mut self, delta_time: f32, mode: DisplayMode) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let view_proj = self.camera.view_projection(aspect);
        let params = IntegratorParams::new(&self.physics, delta_time);

        self.shadow.update(
            &self.queue,
            &ClothUniforms::new(self.light_proj, self.light_dir, self.cloth_alpha, &params),
        );
        self.composite.update(
            &self.queue,
            &ClothUniforms::new(view_proj, self.light_dir, self.cloth_alpha, &params),
            &GroundUniforms::new(view_proj, self.light_proj, mode),
        );
    }

    /// Render one frame and advance the simulation by `delta_time`.
    ///
    /// On a surface error nothing is recorded, so the state is not swapped.
    pub fn display(&mut self, delta_time: f32, mode: DisplayMode) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms(delta_time, mode);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.shadow.record(&mut encoder, &self.buffers, mode);
        self.composite
            .record(&mut encoder, &view, &self.depth_texture, &mut self.buffers);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Index of the position slot the next frame reads.
    pub fn current_index(&self) -> usize {
        self.buffers.current_index()
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
