//! Error types for capture operations.
//!
//! The consolidation pipeline itself never fails: malformed input shrinks the
//! result instead. Errors only surface at the session and export boundaries.

use mesh_io::IoError;
use thiserror::Error;

use crate::session::CapturePhase;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors that can occur at the capture session and export boundaries.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Export was requested before processing completed.
    #[error("mesh is not exportable in phase {phase}")]
    NotExportable {
        /// Phase the session was in.
        phase: CapturePhase,
    },

    /// An export target failed to persist the mesh.
    #[error("export to {target} failed: {source}")]
    Export {
        /// Name of the failing target.
        target: String,
        /// Underlying I/O failure.
        source: IoError,
    },
}
