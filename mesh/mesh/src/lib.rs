//! Body scan capture toolkit.
//!
//! This umbrella crate re-exports the mesh-* crates behind a single
//! dependency. All crates are Layer 0 (zero Bevy dependencies) and can be
//! driven from a native app shell, a CLI, or a test harness.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use mesh::prelude::*;
//!
//! let mut session = CaptureSession::new(SessionParams::default());
//! session.start();
//!
//! // Forward tracker updates while the session polls its timers
//! loop {
//!     // session.ingest_update(update);
//!     if session.poll() == CapturePhase::Processing {
//!         break;
//!     }
//!     std::thread::sleep(Duration::from_millis(16));
//! }
//!
//! session.wait_for_processing();
//! let target = ObjFileTarget::new("body.obj");
//! session.export_to(&[&target]).unwrap().into_result().unwrap();
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Core data structures: `IndexedMesh`, `Vertex`
//! - [`io`] - Plain-text OBJ export and import
//! - [`capture`] - Fragment store, consolidation pipeline, capture session, export
//!
//! # Feature Flags
//!
//! - `serde` - Serialize mesh types and parameter structs

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `IndexedMesh`, `Vertex`.
pub use mesh_types as types;

/// Plain-text OBJ export and import.
pub use mesh_io as io;

/// Fragment ingestion, consolidation, and the capture session.
pub use mesh_capture as capture;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for body scan capture.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{IndexedMesh, MeshTopology, Vertex};

    // I/O
    pub use mesh_io::{load_obj, save_obj, to_obj_string};

    // Pipeline
    pub use mesh_capture::{
        AnchorId, AnchorUpdate, FragmentStore, ProcessingParams, ProcessingReport,
        process_fragments,
    };

    // Session and export
    pub use mesh_capture::{
        CapturePhase, CaptureSession, ExportTarget, IngestOutcome, ObjFileTarget, SessionParams,
    };
}

// =============================================================================
// Tests
// =============================================================================
