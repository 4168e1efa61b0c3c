//! Export of the final mesh to one or more destinations.
//!
//! Collaborators (cloud upload, local save, share sheets) implement
//! [`ExportTarget`]. [`export_all`] fans a single mesh out to every target on
//! the rayon pool and waits for all of them; one target failing never
//! prevents the others from finishing.

use std::fmt;
use std::path::{Path, PathBuf};

use mesh_io::{IoResult, save_obj};
use mesh_types::IndexedMesh;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{CaptureError, CaptureResult};

/// A destination for the final mesh.
pub trait ExportTarget: Send + Sync {
    /// Short name used in reports and logs.
    fn name(&self) -> &str;

    /// Persists the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn export(&self, mesh: &IndexedMesh) -> IoResult<()>;
}

/// Writes the mesh as an OBJ file, atomically.
#[derive(Debug, Clone)]
pub struct ObjFileTarget {
    path: PathBuf,
    name: String,
}

impl ObjFileTarget {
    /// Target writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportTarget for ObjFileTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn export(&self, mesh: &IndexedMesh) -> IoResult<()> {
        save_obj(mesh, &self.path)
    }
}

/// Result of exporting to a single target.
#[derive(Debug)]
pub struct ExportOutcome {
    /// Target name.
    pub target: String,

    /// What the target returned.
    pub result: IoResult<()>,
}

/// Per-target results of [`export_all`], in target order.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// One outcome per target.
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    /// Whether every target succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Converts into the first failure, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Export`] for the first failing target.
    pub fn into_result(self) -> CaptureResult<()> {
        for outcome in self.outcomes {
            if let Err(source) = outcome.result {
                return Err(CaptureError::Export {
                    target: outcome.target,
                    source,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        write!(
            f,
            "Export: {} of {} targets succeeded",
            self.outcomes.len() - failed,
            self.outcomes.len()
        )
    }
}

/// Exports `mesh` to every target concurrently and waits for all of them.
///
/// # Example
///
/// ```
/// use mesh_capture::export::{ExportTarget, ObjFileTarget, export_all};
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let dir = tempfile::tempdir().unwrap();
/// let a = ObjFileTarget::new(dir.path().join("a.obj"));
/// let b = ObjFileTarget::new(dir.path().join("b.obj"));
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// let report = export_all(&mesh, &[&a, &b]);
/// assert!(report.all_succeeded());
/// assert!(a.path().exists() && b.path().exists());
/// ```
#[must_use]
pub fn export_all(mesh: &IndexedMesh, targets: &[&dyn ExportTarget]) -> ExportReport {
    let outcomes: Vec<ExportOutcome> = targets
        .par_iter()
        .map(|target| ExportOutcome {
            target: target.name().to_string(),
            result: target.export(mesh),
        })
        .collect();

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            warn!(target_name = %outcome.target, error = %e, "Export target failed");
        }
    }

    let report = ExportReport { outcomes };
    info!(
        targets = report.outcomes.len(),
        failed = report.failures().count(),
        "Exported mesh"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_io::{IoError, load_obj};
    use mesh_types::Vertex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn triangle() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh
    }

    struct Failing;

    impl ExportTarget for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn export(&self, _mesh: &IndexedMesh) -> IoResult<()> {
            Err(IoError::Io(std::io::Error::other("upload refused")))
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl ExportTarget for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn export(&self, mesh: &IndexedMesh) -> IoResult<()> {
            self.0.fetch_add(mesh.faces.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_no_targets() {
        let report = export_all(&triangle(), &[]);
        assert!(report.outcomes.is_empty());
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_obj_file_target_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = ObjFileTarget::new(dir.path().join("body.obj"));

        target.export(&triangle()).unwrap();

        let loaded = load_obj(target.path()).unwrap();
        assert_eq!(loaded, triangle());
    }

    #[test]
    fn test_failure_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let file = ObjFileTarget::new(dir.path().join("body.obj"));
        let counting = Counting::default();

        let report = export_all(&triangle(), &[&file, &Failing, &counting]);

        assert_eq!(report.outcomes.len(), 3);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.outcomes[1].target, "failing");
        assert!(file.path().exists());
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_into_result_reports_first_failure() {
        let report = export_all(&triangle(), &[&Counting::default(), &Failing]);
        match report.into_result() {
            Err(CaptureError::Export { target, .. }) => assert_eq!(target, "failing"),
            other => panic!("expected export error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = ObjFileTarget::new(dir.path().join("missing").join("body.obj"));

        let report = export_all(&triangle(), &[&target]);
        assert!(!report.all_succeeded());
        assert!(!target.path().exists());
    }

    #[test]
    fn test_display() {
        let report = export_all(&triangle(), &[&Counting::default(), &Failing]);
        assert_eq!(report.to_string(), "Export: 1 of 2 targets succeeded");
    }
}
