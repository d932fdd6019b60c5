//! On-screen pass: the mutating cloth draw, the swap, then the ground.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use super::buffers::StateBuffers;
use super::shadow::ShadowPass;
use super::{storage_entry, uniform_entry, DEPTH_FORMAT};
use crate::grid::Grid;
use crate::shader::{self, ClothUniforms, GroundUniforms};

/// Floor quad at `y = -1` as a triangle strip.
pub const GROUND_VERTICES: [[f32; 3]; 4] = [
    [-2.0, -1.0, -2.0],
    [2.0, -1.0, -2.0],
    [-2.0, -1.0, 2.0],
    [2.0, -1.0, 2.0],
];

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};

fn depth_tested() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub struct CompositePass {
    cloth_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    cloth_uniforms: wgpu::Buffer,
    ground_uniforms: wgpu::Buffer,
    /// Indexed by the state's current slot.
    cloth_bind_groups: [wgpu::BindGroup; 2],
    ground_bind_group: wgpu::BindGroup,
    ground_vertices: wgpu::Buffer,
    stream_len: u32,
}

impl CompositePass {
    pub fn new(
        device: &wgpu::Device,
        grid: &Grid,
        buffers: &StateBuffers,
        shadow: &ShadowPass,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let cloth_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cloth Uniform Buffer"),
            contents: bytemuck::bytes_of(&ClothUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let ground_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ground Uniform Buffer"),
            contents: bytemuck::bytes_of(&GroundUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let ground_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ground Vertex Buffer"),
            contents: bytemuck::cast_slice(&GROUND_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Cloth: uniforms, current, rest, owners, next, velocity
        let cloth_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cloth Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, false),
                storage_entry(5, false),
            ],
        });

        let cloth_bind_groups = [0, 1].map(|parity| {
            let (current, next) = buffers.roles(parity);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Cloth Bind Group"),
                layout: &cloth_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: cloth_uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: current.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers.rest().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: buffers.owners().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: next.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: buffers.velocity().as_entire_binding(),
                    },
                ],
            })
        });

        let ground_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ground Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let ground_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ground Bind Group"),
            layout: &ground_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ground_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow.depth_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(shadow.compare_sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(shadow.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(shadow.color_sampler()),
                },
            ],
        });

        let cloth_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cloth Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::composite_shader(grid).into()),
        });
        let ground_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ground Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::ground_shader().into()),
        });

        let cloth_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cloth Pipeline Layout"),
            bind_group_layouts: &[&cloth_layout],
            push_constant_ranges: &[],
        });

        let cloth_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cloth Pipeline"),
            layout: Some(&cloth_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &cloth_shader,
                entry_point: Some(shader::VS_CLOTH),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &cloth_shader,
                entry_point: Some(shader::FS_CLOTH),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_tested()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let ground_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ground Pipeline Layout"),
            bind_group_layouts: &[&ground_layout],
            push_constant_ranges: &[],
        });

        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Ground Pipeline"),
            layout: Some(&ground_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ground_shader,
                entry_point: Some(shader::VS_GROUND),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &ground_shader,
                entry_point: Some(shader::FS_GROUND),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_tested()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            cloth_pipeline,
            ground_pipeline,
            cloth_uniforms,
            ground_uniforms,
            cloth_bind_groups,
            ground_bind_group,
            ground_vertices,
            stream_len: grid.stream_len(),
        }
    }

    /// Upload the viewer-space uniforms for this frame.
    pub fn update(&self, queue: &wgpu::Queue, cloth: &ClothUniforms, ground: &GroundUniforms) {
        queue.write_buffer(&self.cloth_uniforms, 0, bytemuck::bytes_of(cloth));
        queue.write_buffer(&self.ground_uniforms, 0, bytemuck::bytes_of(ground));
    }

    /// Record the pass: cloth (advancing the simulation), swap, ground.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        buffers: &mut StateBuffers,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.cloth_pipeline);
        pass.set_bind_group(0, &self.cloth_bind_groups[buffers.current_index()], &[]);
        pass.draw(0..self.stream_len, 0..1);

        buffers.swap();

        pass.set_pipeline(&self.ground_pipeline);
        pass.set_bind_group(0, &self.ground_bind_group, &[]);
        pass.set_vertex_buffer(0, self.ground_vertices.slice(..));
        pass.draw(0..GROUND_VERTICES.len() as u32, 0..1);
    }
}
