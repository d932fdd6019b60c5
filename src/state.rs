//! Simulation state: rest positions, ping-ponged positions and velocity.
//!
//! [`PingPong`] is shared by the GPU buffer set and the CPU mirror used for
//! testing, so both make the read/write roles explicit in the same way.

use glam::Vec4;

/// Two slots where one is read ("current") and the other written ("next").
///
/// [`swap`](Self::swap) is the only way the roles change.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    /// Slot `a` starts as current.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current: 0,
        }
    }

    /// Which physical slot is current, `0` or `1`.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The slot read this frame.
    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    /// The slot written this frame.
    #[inline]
    pub fn next(&self) -> &T {
        &self.slots[self.current ^ 1]
    }

    #[inline]
    pub fn next_mut(&mut self) -> &mut T {
        &mut self.slots[self.current ^ 1]
    }

    /// Borrow both roles at once: `(current, next)`.
    pub fn split(&mut self) -> (&T, &mut T) {
        let (first, second) = self.slots.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// The `(read, write)` pair that is active when `current_index` is
    /// `parity`. Used to build one binding per parity up front.
    pub fn roles(&self, parity: usize) -> (&T, &T) {
        (&self.slots[parity & 1], &self.slots[(parity & 1) ^ 1])
    }

    /// Promote next to current.
    #[inline]
    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}

/// CPU copy of the simulation buffers.
///
/// Mirrors the device-side layout: `vec4` per vertex, positions with `w = 1`,
/// velocity with `w = 0`.
#[derive(Debug)]
pub struct SimulationState {
    rest: Vec<Vec4>,
    positions: PingPong<Vec<Vec4>>,
    velocity: Vec<Vec4>,
}

impl SimulationState {
    /// Zeroed buffers for `vertex_count` vertices.
    pub fn allocate(vertex_count: usize) -> Self {
        Self {
            rest: vec![Vec4::ZERO; vertex_count],
            positions: PingPong::new(vec![Vec4::ZERO; vertex_count], vec![Vec4::ZERO; vertex_count]),
            velocity: vec![Vec4::ZERO; vertex_count],
        }
    }

    /// Copy the rest shape into the rest buffer and both position slots and
    /// zero the velocity.
    pub fn seed(&mut self, rest_shape: &[Vec4]) {
        assert_eq!(rest_shape.len(), self.rest.len(), "rest shape does not match allocation");
        self.rest.copy_from_slice(rest_shape);
        self.positions.next_mut().copy_from_slice(rest_shape);
        self.positions.swap();
        self.positions.next_mut().copy_from_slice(rest_shape);
        self.positions.swap();
        self.velocity.fill(Vec4::ZERO);
    }

    /// Allocate and seed in one go.
    pub fn from_rest_shape(rest_shape: &[Vec4]) -> Self {
        let mut state = Self::allocate(rest_shape.len());
        state.seed(rest_shape);
        state
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.rest.len()
    }

    #[inline]
    pub fn rest(&self) -> &[Vec4] {
        &self.rest
    }

    #[inline]
    pub fn current(&self) -> &[Vec4] {
        self.positions.current()
    }

    #[inline]
    pub fn next(&self) -> &[Vec4] {
        self.positions.next()
    }

    #[inline]
    pub fn velocity(&self) -> &[Vec4] {
        &self.velocity
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.positions.current_index()
    }

    /// Everything one integration step touches: rest and current for
    /// reading, next and velocity for writing.
    pub fn step_views(&mut self) -> StepViews<'_> {
        let (current, next) = self.positions.split();
        StepViews {
            rest: &self.rest,
            current,
            next,
            velocity: &mut self.velocity,
        }
    }

    /// Promote next to current. Call once per completed frame.
    pub fn swap(&mut self) {
        self.positions.swap();
    }
}

/// Disjoint borrows of the state for one integration step.
pub struct StepViews<'a> {
    pub rest: &'a [Vec4],
    pub current: &'a [Vec4],
    pub next: &'a mut [Vec4],
    pub velocity: &'a mut [Vec4],
}
