//! Integration tests for the cloth lattice.
//!
//! Every stream index must land on a real vertex, every vertex must be
//! reachable from the stream, and exactly one stream index may write it.

use drape::Grid;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

fn random_grids(count: usize) -> Vec<Grid> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|_| Grid::new(rng.gen_range(2..=48), rng.gen_range(2..=32)))
        .collect()
}

// ============================================================================
// Closure
// ============================================================================

#[test]
fn test_stream_decodes_inside_grid() {
    for grid in random_grids(20) {
        for i in 0..grid.stream_len() {
            let r = grid.stream_ref(i);
            assert!(r.x < grid.row_length());
            assert!(r.y < grid.column_length());
            assert!(r.tex_coord.x >= 0.0 && r.tex_coord.x <= 1.0);
            assert!(r.tex_coord.y >= 0.0 && r.tex_coord.y < 1.0);
        }
    }
}

#[test]
fn test_references_partition_stream() {
    for grid in random_grids(20) {
        let mut seen = vec![0u32; grid.stream_len() as usize];
        for index in 0..grid.vertex_count() {
            let (x, y) = grid.coords(index);
            let refs = grid.references(x, y);
            assert!(!refs.is_empty(), "vertex ({x}, {y}) unreachable in {grid:?}");
            for i in refs {
                assert_eq!(grid.stream_vertex(i), index);
                seen[i as usize] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1), "stream not partitioned in {grid:?}");
    }
}

// ============================================================================
// Single writer
// ============================================================================

#[test]
fn test_exactly_one_owner_per_vertex() {
    for grid in random_grids(20) {
        for index in 0..grid.vertex_count() {
            let (x, y) = grid.coords(index);
            let owners: Vec<u32> = grid
                .references(x, y)
                .into_iter()
                .filter(|&i| grid.owns(i))
                .collect();
            assert_eq!(owners.len(), 1, "vertex ({x}, {y}) in {grid:?}");
        }
    }
}

#[test]
fn test_owner_table_matches_predicate() {
    for grid in random_grids(20) {
        let table = grid.owner_table();
        assert_eq!(table.len(), grid.vertex_count() as usize);

        for i in 0..grid.stream_len() {
            let vertex = grid.stream_vertex(i) as usize;
            assert_eq!(table[vertex] == i, grid.owns(i), "stream index {i} in {grid:?}");
        }
    }
}

#[test]
fn test_only_last_row_coincides_twice() {
    let grid = Grid::new(7, 5);
    for index in 0..grid.vertex_count() {
        let (x, y) = grid.coords(index);
        let coinciding = grid
            .references(x, y)
            .into_iter()
            .filter(|&i| grid.coincides(i))
            .count();
        let expected = if y == grid.last_row() { 2 } else { 1 };
        assert_eq!(coinciding, expected, "vertex ({x}, {y})");
    }
}
