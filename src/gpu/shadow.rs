//! Off-screen pass drawing the cloth from the light.
//!
//! Produces a depth target for the ground's shadow comparison and a color
//! target the ground copies in [`DisplayMode::Color`]. The cloth stream is
//! traversed read-only here; nothing in this pass writes simulation state.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use super::buffers::StateBuffers;
use super::{storage_entry, uniform_entry, DEPTH_FORMAT};
use crate::display::DisplayMode;
use crate::grid::Grid;
use crate::shader::{self, ClothUniforms};

pub const SHADOW_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// `src_alpha * src + dst`, on both color and alpha.
const ADDITIVE_ALPHA: wgpu::BlendComponent = wgpu::BlendComponent {
    src_factor: wgpu::BlendFactor::SrcAlpha,
    dst_factor: wgpu::BlendFactor::One,
    operation: wgpu::BlendOperation::Add,
};

/// Depth state of the shadow pipeline for `mode`: tested and written in
/// [`DisplayMode::Shadow`], ignored in [`DisplayMode::Color`].
pub fn depth_stencil_state(mode: DisplayMode) -> wgpu::DepthStencilState {
    let (depth_write_enabled, depth_compare) = if mode.depth_test() {
        (true, wgpu::CompareFunction::Less)
    } else {
        (false, wgpu::CompareFunction::Always)
    };
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub struct ShadowPass {
    depth_view: wgpu::TextureView,
    color_view: wgpu::TextureView,
    compare_sampler: wgpu::Sampler,
    color_sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    /// Indexed by the state's current slot.
    bind_groups: [wgpu::BindGroup; 2],
    depth_tested: wgpu::RenderPipeline,
    depth_ignored: wgpu::RenderPipeline,
    stream_len: u32,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, grid: &Grid, buffers: &StateBuffers, size: u32) -> Self {
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        };
        let target = |label: &str, format: wgpu::TextureFormat| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let depth_view = target("Shadow Depth", DEPTH_FORMAT);
        let color_view = target("Shadow Color", SHADOW_COLOR_FORMAT);

        let compare_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Compare Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let color_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Color Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Uniform Buffer"),
            contents: bytemuck::bytes_of(&ClothUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                storage_entry(1, true),
            ],
        });

        // Only the read slot is bound; one group per parity
        let bind_groups = [0, 1].map(|parity| {
            let (current, _) = buffers.roles(parity);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shadow Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: current.as_entire_binding(),
                    },
                ],
            })
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::shadow_shader(grid).into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, mode: DisplayMode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(shader::VS_SHADOW),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(shader::FS_CLOTH),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: SHADOW_COLOR_FORMAT,
                        blend: Some(wgpu::BlendState {
                            color: ADDITIVE_ALPHA,
                            alpha: ADDITIVE_ALPHA,
                        }),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(depth_stencil_state(mode)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let depth_tested = pipeline("Shadow Pipeline (depth tested)", DisplayMode::Shadow);
        let depth_ignored = pipeline("Shadow Pipeline (depth ignored)", DisplayMode::Color);

        Self {
            depth_view,
            color_view,
            compare_sampler,
            color_sampler,
            uniform_buffer,
            bind_groups,
            depth_tested,
            depth_ignored,
            stream_len: grid.stream_len(),
        }
    }

    /// Upload the light-space uniforms for this frame.
    pub fn update(&self, queue: &wgpu::Queue, uniforms: &ClothUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record the pass. Reads the current position slot only.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, buffers: &StateBuffers, mode: DisplayMode) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let pipeline = if mode.depth_test() {
            &self.depth_tested
        } else {
            &self.depth_ignored
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_groups[buffers.current_index()], &[]);
        pass.draw(0..self.stream_len, 0..1);
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn compare_sampler(&self) -> &wgpu::Sampler {
        &self.compare_sampler
    }

    pub fn color_sampler(&self) -> &wgpu::Sampler {
        &self.color_sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_state_follows_mode() {
        let color = depth_stencil_state(DisplayMode::Color);
        assert!(!color.depth_write_enabled);
        assert_eq!(color.depth_compare, wgpu::CompareFunction::Always);

        let shadow = depth_stencil_state(DisplayMode::Shadow);
        assert!(shadow.depth_write_enabled);
        assert_eq!(shadow.depth_compare, wgpu::CompareFunction::Less);
        assert_eq!(shadow.format, DEPTH_FORMAT);
    }
}
