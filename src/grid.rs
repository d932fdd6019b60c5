//! Cloth lattice topology.
//!
//! The cloth is a cylinder of `column_length` rings with `row_length`
//! vertices each. Columns wrap around (`x` is taken modulo `row_length`),
//! rows do not (`y` is clamped to `[0, column_length - 1]`).
//!
//! The cloth is drawn as a non-indexed triangle stream: every cell (quad
//! between ring `y` and `y + 1`) emits six stream references, so a stream
//! index alone is enough to recover the grid vertex it refers to. Several
//! stream references share a vertex; [`Grid::owner_table`] picks the single
//! one allowed to write that vertex's state.

use glam::{Vec2, Vec4};

/// Per-cell offsets of the six stream references (two triangles).
pub const CELL_OFFSETS: [(u32, u32); 6] = [(0, 0), (0, 1), (1, 0), (1, 0), (0, 1), (1, 1)];

/// A triangle-stream reference decoded back into grid terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamRef {
    pub cell_x: u32,
    pub cell_y: u32,
    /// Slot within the cell, `0..6`.
    pub slot: u32,
    pub x: u32,
    pub y: u32,
    /// Texture coordinate. `u` is not wrapped, so the seam reaches 1.0.
    pub tex_coord: Vec2,
}

/// Fixed row/column lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    row_length: u32,
    column_length: u32,
}

impl Grid {
    /// Create a lattice.
    ///
    /// # Panics
    ///
    /// If there are fewer than two columns or fewer than two rings.
    pub fn new(row_length: u32, column_length: u32) -> Self {
        assert!(row_length >= 2, "Grid needs at least two columns to wrap");
        assert!(column_length >= 2, "Grid needs at least two rings to form a cell");
        Self {
            row_length,
            column_length,
        }
    }

    #[inline]
    pub fn row_length(&self) -> u32 {
        self.row_length
    }

    #[inline]
    pub fn column_length(&self) -> u32 {
        self.column_length
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.row_length * self.column_length
    }

    #[inline]
    pub fn cell_count(&self) -> u32 {
        self.row_length * (self.column_length - 1)
    }

    /// Length of the triangle stream drawn each pass.
    #[inline]
    pub fn stream_len(&self) -> u32 {
        6 * self.cell_count()
    }

    #[inline]
    pub fn last_row(&self) -> u32 {
        self.column_length - 1
    }

    /// Linear vertex index of `(x, y)`. `x` wraps.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> u32 {
        y * self.row_length + x % self.row_length
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn coords(&self, index: u32) -> (u32, u32) {
        (index % self.row_length, index / self.row_length)
    }

    /// Decode stream index `i` into the cell it belongs to and the vertex it
    /// references.
    pub fn stream_ref(&self, i: u32) -> StreamRef {
        debug_assert!(i < self.stream_len());
        let cell = i / 6;
        let slot = i % 6;
        let cell_x = cell % self.row_length;
        let cell_y = cell / self.row_length;
        let (dx, dy) = CELL_OFFSETS[slot as usize];
        let unwrapped_x = cell_x + dx;
        let y = cell_y + dy;

        StreamRef {
            cell_x,
            cell_y,
            slot,
            x: unwrapped_x % self.row_length,
            y,
            tex_coord: Vec2::new(
                unwrapped_x as f32 / self.row_length as f32,
                y as f32 / self.column_length as f32,
            ),
        }
    }

    /// Vertex index referenced by stream index `i`.
    #[inline]
    pub fn stream_vertex(&self, i: u32) -> u32 {
        let r = self.stream_ref(i);
        self.index(r.x, r.y)
    }

    /// Every stream index that resolves to `(x, y)`.
    pub fn references(&self, x: u32, y: u32) -> Vec<u32> {
        let x = x % self.row_length;
        let mut refs = Vec::with_capacity(6);
        for (slot, &(dx, dy)) in CELL_OFFSETS.iter().enumerate() {
            if dy > y || y - dy >= self.column_length - 1 {
                continue;
            }
            let cell_y = y - dy;
            let cell_x = (x + self.row_length - dx) % self.row_length;
            refs.push(6 * (cell_y * self.row_length + cell_x) + slot as u32);
        }
        refs.sort_unstable();
        refs
    }

    /// Coordinate-coincidence test: the cell's `x` matches the vertex's `x`,
    /// and the cell's `y` matches the vertex's `y` or the vertex is in the
    /// last row.
    ///
    /// Last-row vertices satisfy this twice per cell (slots 1 and 4 both
    /// carry offset `(0, 1)`), so it is not a single-writer rule on its own.
    pub fn coincides(&self, i: u32) -> bool {
        let r = self.stream_ref(i);
        r.cell_x == r.x && (r.cell_y == r.y || r.y == self.last_row())
    }

    /// Ownership predicate: coincidence, with the last-row tie broken towards
    /// the lower slot.
    pub fn owns(&self, i: u32) -> bool {
        self.coincides(i) && i % 6 != 4
    }

    /// Stream index of the owning reference for every vertex.
    pub fn owner_table(&self) -> Vec<u32> {
        let mut owners = vec![u32::MAX; self.vertex_count() as usize];
        for i in (0..self.stream_len()).filter(|&i| self.owns(i)) {
            let vertex = self.stream_vertex(i) as usize;
            debug_assert_eq!(owners[vertex], u32::MAX, "vertex {vertex} owned twice");
            owners[vertex] = i;
        }
        owners
    }

    /// Grid neighbors in the 3×3 block around `(x, y)`, self excluded.
    ///
    /// `x` wraps, so every vertex has left and right neighbors; row 0 has no
    /// row above and the last row has no row below.
    pub fn neighbors(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let row_length = self.row_length;
        let last_row = self.last_row();
        (-1i32..=1)
            .filter(move |&dy| !(dy == -1 && y == 0) && !(dy == 1 && y == last_row))
            .flat_map(move |dy| (-1i32..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| {
                let other_x = ((x + row_length) as i32 + dx) as u32 % row_length;
                let other_y = (y as i32 + dy) as u32;
                (other_x, other_y)
            })
    }

    /// Initial cone-frustum shape: stacked rings interpolating from
    /// `upper_radius` at row 0 towards `lower_radius`, top ring at `y = 0.5`.
    pub fn rest_shape(&self, upper_radius: f32, lower_radius: f32) -> Vec<Vec4> {
        let mut positions = Vec::with_capacity(self.vertex_count() as usize);
        for y in 0..self.column_length {
            let y_fraction = y as f32 / self.column_length as f32;
            let radius = (1.0 - y_fraction) * upper_radius + y_fraction * lower_radius;
            for x in 0..self.row_length {
                let angle = std::f32::consts::TAU * x as f32 / self.row_length as f32;
                positions.push(Vec4::new(
                    angle.cos() * radius,
                    0.5 - y_fraction,
                    -angle.sin() * radius,
                    1.0,
                ));
            }
        }
        positions
    }
}
