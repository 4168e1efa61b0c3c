//! Near-coincident vertex deduplication.
//!
//! Overlapping scan fragments sample the same physical points more than once.
//! This pass collapses those samples with a greedy, order-dependent merge:
//!
//! 1. Walk vertices in their existing order, building a list of unique vertices.
//! 2. A vertex joins the **first** unique vertex (lowest index) whose distance
//!    to it is strictly below the tolerance; otherwise it becomes a new unique
//!    vertex.
//! 3. Faces are rewritten through the resulting `original -> unique` map. A
//!    face with an index outside the map is dropped whole.
//!
//! Merging is not transitive: a vertex is only compared against vertices that
//! were already accepted as unique, so chains of near neighbours can resolve
//! differently depending on input order. Faces whose corners collapse onto the
//! same unique vertex are kept as-is.
//!
//! # Strategies
//!
//! [`DedupStrategy::Naive`] is the reference O(n²) scan. [`DedupStrategy::Grid`]
//! buckets unique vertices in a spatial hash with cells twice the tolerance
//! wide. A vertex within tolerance of `v` differs from it by less than half a
//! cell on every axis, so it always lies in one of the 27 cells around `v`;
//! taking the lowest matching index among those cells is therefore exactly the
//! naive scan's first match.

// Mesh indices are u32; > 4B vertices is unsupported
#![allow(clippy::cast_possible_truncation)]

use hashbrown::HashMap;
use mesh_types::{Face, IndexedMesh, Vertex};
use tracing::debug;

use crate::params::{DedupParams, DedupStrategy};

/// Result of a deduplication pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DedupResult {
    /// Vertices before the pass.
    pub original_vertices: usize,

    /// Vertices after the pass.
    pub unique_vertices: usize,

    /// Faces dropped because an index could not be remapped.
    pub faces_dropped: usize,
}

impl DedupResult {
    /// Number of vertices folded into an earlier one.
    #[must_use]
    pub const fn vertices_merged(&self) -> usize {
        self.original_vertices - self.unique_vertices
    }
}

impl std::fmt::Display for DedupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dedup: {} → {} vertices ({} merged), {} faces dropped",
            self.original_vertices,
            self.unique_vertices,
            self.vertices_merged(),
            self.faces_dropped
        )
    }
}

/// Merges vertices closer than `params.tolerance`, in place.
///
/// An empty mesh is left unchanged.
///
/// # Example
///
/// ```
/// use mesh_capture::dedup::deduplicate;
/// use mesh_capture::DedupParams;
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0005));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 3, 2]);
///
/// let result = deduplicate(&mut mesh, &DedupParams::default());
/// assert_eq!(result.vertices_merged(), 1);
/// assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 1, 2]]);
/// ```
pub fn deduplicate(mesh: &mut IndexedMesh, params: &DedupParams) -> DedupResult {
    let original_vertices = mesh.vertices.len();
    if original_vertices == 0 {
        return DedupResult::default();
    }

    let (unique, mapping) = match params.strategy {
        DedupStrategy::Grid if usable_cell_tolerance(params.tolerance) => {
            assign_grid(&mesh.vertices, params.tolerance)
        }
        _ => assign_naive(&mesh.vertices, params.tolerance),
    };

    let original_faces = mesh.faces.len();
    let faces: Vec<Face> = mesh
        .faces
        .iter()
        .filter_map(|&[a, b, c]| {
            Some([
                *mapping.get(a as usize)?,
                *mapping.get(b as usize)?,
                *mapping.get(c as usize)?,
            ])
        })
        .collect();

    let result = DedupResult {
        original_vertices,
        unique_vertices: unique.len(),
        faces_dropped: original_faces - faces.len(),
    };

    mesh.vertices = unique;
    mesh.faces = faces;

    debug!(
        original = result.original_vertices,
        unique = result.unique_vertices,
        faces_dropped = result.faces_dropped,
        strategy = ?params.strategy,
        "Deduplicated vertices"
    );

    result
}

/// The grid needs a finite, positive cell size.
fn usable_cell_tolerance(tolerance: f64) -> bool {
    tolerance.is_finite() && tolerance > 0.0
}

/// Reference nested scan.
fn assign_naive(vertices: &[Vertex], tolerance: f64) -> (Vec<Vertex>, Vec<u32>) {
    let mut unique: Vec<Vertex> = Vec::new();
    let mut mapping = Vec::with_capacity(vertices.len());

    for v in vertices {
        let slot = match unique.iter().position(|u| u.distance_to(v) < tolerance) {
            Some(existing) => existing,
            None => {
                unique.push(*v);
                unique.len() - 1
            }
        };
        mapping.push(slot as u32);
    }

    (unique, mapping)
}

type Cell = (i64, i64, i64);

/// Spatial-hash scan with the same merge decisions as [`assign_naive`].
fn assign_grid(vertices: &[Vertex], tolerance: f64) -> (Vec<Vertex>, Vec<u32>) {
    let cell_size = tolerance * 2.0;
    let mut grid: HashMap<Cell, Vec<u32>> = HashMap::new();
    let mut unique: Vec<Vertex> = Vec::new();
    let mut mapping = Vec::with_capacity(vertices.len());

    for v in vertices {
        let cell = cell_of(v, cell_size);
        let mut best: Option<u32> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (
                        cell.0.saturating_add(dx),
                        cell.1.saturating_add(dy),
                        cell.2.saturating_add(dz),
                    );
                    let Some(bucket) = grid.get(&neighbor) else {
                        continue;
                    };

                    // Buckets are filled in ascending index order
                    for &candidate in bucket {
                        if best.is_some_and(|b| candidate >= b) {
                            break;
                        }
                        if unique[candidate as usize].distance_to(v) < tolerance {
                            best = Some(candidate);
                            break;
                        }
                    }
                }
            }
        }

        let slot = best.unwrap_or_else(|| {
            let idx = unique.len() as u32;
            unique.push(*v);
            grid.entry(cell).or_default().push(idx);
            idx
        });
        mapping.push(slot);
    }

    (unique, mapping)
}

/// Saturating float → cell conversion; NaN lands in cell 0 and never matches.
#[allow(clippy::cast_possible_truncation)]
fn cell_of(v: &Vertex, cell_size: f64) -> Cell {
    (
        (v.position.x / cell_size).floor() as i64,
        (v.position.y / cell_size).floor() as i64,
        (v.position.z / cell_size).floor() as i64,
    )
}
