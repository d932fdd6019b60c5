//! Device-side simulation state.

use glam::Vec4;
use wgpu::util::DeviceExt;

use crate::grid::Grid;
use crate::state::PingPong;

/// Rest shape, ping-ponged positions, velocity and the owner table, all as
/// storage buffers.
pub struct StateBuffers {
    rest: wgpu::Buffer,
    positions: PingPong<wgpu::Buffer>,
    velocity: wgpu::Buffer,
    owners: wgpu::Buffer,
    vertex_count: u32,
}

impl StateBuffers {
    /// Upload `rest_shape` into the rest buffer and both position slots,
    /// zero the velocity and upload the grid's owner table.
    pub fn new(device: &wgpu::Device, grid: &Grid, rest_shape: &[Vec4]) -> Self {
        debug_assert_eq!(rest_shape.len(), grid.vertex_count() as usize);

        let rest = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Rest Positions"),
            contents: bytemuck::cast_slice(rest_shape),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let position_slot = |label: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(rest_shape),
                usage: wgpu::BufferUsages::STORAGE,
            })
        };
        let positions = PingPong::new(position_slot("Positions A"), position_slot("Positions B"));

        let velocity = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Velocities"),
            contents: bytemuck::cast_slice(&vec![Vec4::ZERO; rest_shape.len()]),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let owners = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Owner Table"),
            contents: bytemuck::cast_slice(&grid.owner_table()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self {
            rest,
            positions,
            velocity,
            owners,
            vertex_count: grid.vertex_count(),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Which position slot is read this frame.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.positions.current_index()
    }

    /// `(read, write)` position buffers when the current index is `parity`.
    pub fn roles(&self, parity: usize) -> (&wgpu::Buffer, &wgpu::Buffer) {
        self.positions.roles(parity)
    }

    pub fn rest(&self) -> &wgpu::Buffer {
        &self.rest
    }

    pub fn velocity(&self) -> &wgpu::Buffer {
        &self.velocity
    }

    pub fn owners(&self) -> &wgpu::Buffer {
        &self.owners
    }

    /// Promote next to current. Exactly once per frame, after the
    /// mutating draw has been recorded.
    pub fn swap(&mut self) {
        self.positions.swap();
    }
}
