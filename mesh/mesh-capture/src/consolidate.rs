//! Fragment consolidation.
//!
//! Concatenates every fragment into one indexed buffer, offsetting each
//! fragment's face indices by the number of vertices appended before it.

// Mesh indices are u32; > 4B vertices is unsupported
#![allow(clippy::cast_possible_truncation)]

use mesh_types::IndexedMesh;
use tracing::debug;

use crate::fragment::Fragment;

/// Concatenates fragments into a single mesh.
///
/// Vertices keep fragment order. A face referencing an index outside its own
/// fragment is dropped, since offsetting it would silently point into a
/// neighbouring fragment.
///
/// # Example
///
/// ```
/// use mesh_capture::consolidate::consolidate;
/// use mesh_capture::fragment::{AnchorId, Fragment};
/// use mesh_types::Vertex;
///
/// let frag = |id| Fragment {
///     identity: AnchorId::new(id),
///     vertices: vec![
///         Vertex::from_coords(0.0, 0.0, 0.0),
///         Vertex::from_coords(1.0, 0.0, 0.0),
///         Vertex::from_coords(0.0, 1.0, 0.0),
///     ],
///     faces: vec![[0, 1, 2]],
/// };
///
/// let mesh = consolidate(&[frag(1), frag(2)]);
/// assert_eq!(mesh.vertices.len(), 6);
/// assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
/// ```
#[must_use]
pub fn consolidate(fragments: &[Fragment]) -> IndexedMesh {
    let vertex_total = fragments.iter().map(|f| f.vertices.len()).sum();
    let face_total = fragments.iter().map(|f| f.faces.len()).sum();
    let mut merged = IndexedMesh::with_capacity(vertex_total, face_total);

    for fragment in fragments {
        let offset = merged.vertices.len() as u32;
        let local_count = fragment.vertices.len();

        merged.vertices.extend_from_slice(&fragment.vertices);

        let before = merged.faces.len();
        merged.faces.extend(
            fragment
                .faces
                .iter()
                .filter(|face| face.iter().all(|&i| (i as usize) < local_count))
                .map(|&[a, b, c]| [a + offset, b + offset, c + offset]),
        );

        let dropped = fragment.faces.len() - (merged.faces.len() - before);
        if dropped > 0 {
            debug!(
                anchor = %fragment.identity,
                dropped,
                "Dropped fragment faces with out-of-range indices"
            );
        }
    }

    merged
}
