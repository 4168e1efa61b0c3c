//! Body-region filtering.
//!
//! Drops stray geometry (walls, floor, furniture) picked up around the subject
//! by keeping only vertices within a fixed radius of the mesh centroid.

// Mesh indices are u32; > 4B vertices is unsupported
#![allow(clippy::cast_possible_truncation)]

use mesh_types::{Face, IndexedMesh, Point3};
use tracing::debug;

use crate::params::RegionParams;

/// Result of a region filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionFilterResult {
    /// Centroid the radius was measured from; `None` for an empty mesh.
    pub centroid: Option<Point3<f64>>,

    /// Vertices before filtering.
    pub original_vertices: usize,

    /// Vertices within the radius.
    pub kept_vertices: usize,

    /// Faces dropped because a corner was removed.
    pub faces_dropped: usize,
}

impl RegionFilterResult {
    /// Number of vertices removed.
    #[must_use]
    pub const fn vertices_removed(&self) -> usize {
        self.original_vertices - self.kept_vertices
    }
}

impl std::fmt::Display for RegionFilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Region: {} → {} vertices, {} faces dropped",
            self.original_vertices, self.kept_vertices, self.faces_dropped
        )
    }
}

/// Keeps vertices within `params.radius` (inclusive) of the centroid, in place.
///
/// Faces survive only if all three corners survive; their indices are
/// rewritten to the compacted vertex list. An empty mesh is left unchanged.
///
/// # Example
///
/// ```
/// use mesh_capture::region::filter_to_body_region;
/// use mesh_capture::RegionParams;
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.1, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.1, 0.0));
/// mesh.vertices.push(Vertex::from_coords(3.0, 0.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 1, 3]);
///
/// let result = filter_to_body_region(&mut mesh, &RegionParams::default());
/// assert_eq!(mesh.vertices.len(), 3);
/// assert_eq!(mesh.faces, vec![[0, 1, 2]]);
/// assert_eq!(result.faces_dropped, 1);
/// ```
pub fn filter_to_body_region(mesh: &mut IndexedMesh, params: &RegionParams) -> RegionFilterResult {
    let original_vertices = mesh.vertices.len();
    let Some(centroid) = mesh.centroid() else {
        return RegionFilterResult::default();
    };

    let mut remap: Vec<Option<u32>> = Vec::with_capacity(original_vertices);
    let mut kept = Vec::with_capacity(original_vertices);

    for v in &mesh.vertices {
        if nalgebra::distance(&v.position, &centroid) <= params.radius {
            remap.push(Some(kept.len() as u32));
            kept.push(*v);
        } else {
            remap.push(None);
        }
    }

    let original_faces = mesh.faces.len();
    let lookup = |i: u32| remap.get(i as usize).copied().flatten();
    let faces: Vec<Face> = mesh
        .faces
        .iter()
        .filter_map(|&[a, b, c]| Some([lookup(a)?, lookup(b)?, lookup(c)?]))
        .collect();

    let result = RegionFilterResult {
        centroid: Some(centroid),
        original_vertices,
        kept_vertices: kept.len(),
        faces_dropped: original_faces - faces.len(),
    };

    mesh.vertices = kept;
    mesh.faces = faces;

    debug!(
        centroid = ?(centroid.x, centroid.y, centroid.z),
        radius = params.radius,
        kept = result.kept_vertices,
        removed = result.vertices_removed(),
        faces_dropped = result.faces_dropped,
        "Filtered to body region"
    );

    result
}
