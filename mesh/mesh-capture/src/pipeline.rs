//! The consolidation pipeline: consolidate → deduplicate → filter.

use mesh_types::IndexedMesh;
use tracing::info;

use crate::consolidate::consolidate;
use crate::dedup::{DedupResult, deduplicate};
use crate::fragment::Fragment;
use crate::params::ProcessingParams;
use crate::region::{RegionFilterResult, filter_to_body_region};

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingReport {
    /// The final body mesh.
    pub mesh: IndexedMesh,

    /// Fragments that went into consolidation.
    pub fragment_count: usize,

    /// Vertices after consolidation.
    pub consolidated_vertices: usize,

    /// Faces after consolidation.
    pub consolidated_faces: usize,

    /// Deduplication statistics.
    pub dedup: DedupResult,

    /// Region filter statistics.
    pub region: RegionFilterResult,
}

impl std::fmt::Display for ProcessingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Processing: {} fragments → {} vertices, {} faces",
            self.fragment_count,
            self.mesh.vertices.len(),
            self.mesh.faces.len()
        )?;
        writeln!(
            f,
            "  Consolidated: {} vertices, {} faces",
            self.consolidated_vertices, self.consolidated_faces
        )?;
        writeln!(f, "  {}", self.dedup)?;
        write!(f, "  {}", self.region)
    }
}

/// Runs the three stages over `fragments`, strictly in order.
///
/// Never fails; malformed faces are dropped along the way and an empty
/// fragment list yields an empty mesh.
///
/// # Example
///
/// ```
/// use mesh_capture::fragment::{AnchorId, Fragment};
/// use mesh_capture::{ProcessingParams, process_fragments};
/// use mesh_types::Vertex;
///
/// let tri = vec![
///     Vertex::from_coords(0.0, 0.0, 0.0),
///     Vertex::from_coords(0.1, 0.0, 0.0),
///     Vertex::from_coords(0.0, 0.1, 0.0),
/// ];
/// let fragments = vec![
///     Fragment { identity: AnchorId::new(1), vertices: tri.clone(), faces: vec![[0, 1, 2]] },
///     Fragment { identity: AnchorId::new(2), vertices: tri, faces: vec![[0, 1, 2]] },
/// ];
///
/// let report = process_fragments(&fragments, &ProcessingParams::default());
/// assert_eq!(report.mesh.vertices.len(), 3);
/// assert_eq!(report.mesh.faces, vec![[0, 1, 2], [0, 1, 2]]);
/// ```
#[must_use]
pub fn process_fragments(fragments: &[Fragment], params: &ProcessingParams) -> ProcessingReport {
    let mut mesh = consolidate(fragments);
    let consolidated_vertices = mesh.vertices.len();
    let consolidated_faces = mesh.faces.len();

    info!(
        fragments = fragments.len(),
        vertices = consolidated_vertices,
        faces = consolidated_faces,
        "Consolidated fragments"
    );

    let dedup = deduplicate(&mut mesh, &params.dedup);
    info!(
        unique = dedup.unique_vertices,
        merged = dedup.vertices_merged(),
        "Deduplicated mesh"
    );

    let region = filter_to_body_region(&mut mesh, &params.region);
    info!(
        kept = region.kept_vertices,
        removed = region.vertices_removed(),
        faces = mesh.faces.len(),
        "Filtered mesh to body region"
    );

    ProcessingReport {
        mesh,
        fragment_count: fragments.len(),
        consolidated_vertices,
        consolidated_faces,
        dedup,
        region,
    }
}
