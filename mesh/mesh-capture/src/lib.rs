//! Multi-view body scan capture and consolidation.
//!
//! A tracking subsystem reports partial meshes ("fragments") for each surface
//! anchor it sees while the subject turns in front of the sensor. This crate
//! turns those fragments into a single body mesh:
//!
//! - **Fragments** - latest geometry per anchor, replaced on every update
//! - **Consolidation** - concatenate fragments into one indexed buffer
//! - **Deduplication** - merge vertices closer than a tolerance
//! - **Region filtering** - drop geometry far from the body centroid
//! - **Session** - timed capture phases that gate ingestion and trigger processing
//! - **Export** - fan the final mesh out to one or more destinations
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Quick Start
//!
//! ## Processing fragments directly
//!
//! ```
//! use mesh_capture::fragment::{AnchorId, FragmentStore};
//! use mesh_capture::{ProcessingParams, process_fragments};
//! use mesh_types::Vertex;
//!
//! let mut store = FragmentStore::new();
//! let tri = |x: f64| vec![
//!     Vertex::from_coords(x, 0.0, 0.0),
//!     Vertex::from_coords(x + 0.1, 0.0, 0.0),
//!     Vertex::from_coords(x, 0.1, 0.0),
//! ];
//! store.upsert(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]);
//! store.upsert(AnchorId::new(2), tri(0.0), vec![[0, 1, 2]]);
//!
//! let report = process_fragments(store.all(), &ProcessingParams::default());
//! println!("{report}");
//! assert_eq!(report.mesh.vertices.len(), 3);
//! ```
//!
//! ## Driving a session
//!
//! ```
//! use std::time::{Duration, Instant};
//! use mesh_capture::{CaptureSession, SessionParams};
//!
//! let mut session = CaptureSession::new(
//!     SessionParams::default().with_phase_duration(Duration::from_millis(10)),
//! );
//! let t0 = Instant::now();
//! session.start_at(t0);
//! session.poll_at(t0 + Duration::from_millis(40));
//! session.wait_for_processing();
//!
//! let obj = session.export_text().unwrap();
//! assert!(obj.starts_with('#'));
//! ```
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fragment`] | Per-anchor fragment store |
//! | [`consolidate`] | Fragment concatenation |
//! | [`dedup`] | Near-coincident vertex merging |
//! | [`region`] | Fixed-radius body-region filter |
//! | [`pipeline`] | The three stages in sequence |
//! | [`session`] | Phase state machine and timers |
//! | [`export`] | Concurrent multi-target export |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]

pub mod consolidate;
pub mod dedup;
pub mod error;
pub mod export;
pub mod fragment;
pub mod params;
pub mod pipeline;
pub mod region;
pub mod session;

pub use consolidate::consolidate;
pub use dedup::{DedupResult, deduplicate};
pub use error::{CaptureError, CaptureResult};
pub use export::{ExportOutcome, ExportReport, ExportTarget, ObjFileTarget, export_all};
pub use fragment::{AnchorId, AnchorUpdate, Fragment, FragmentStore, UpsertOutcome};
pub use params::{DedupParams, DedupStrategy, ProcessingParams, RegionParams, SessionParams};
pub use pipeline::{ProcessingReport, process_fragments};
pub use region::{RegionFilterResult, filter_to_body_region};
pub use session::{CancelToken, CapturePhase, CaptureSession, IngestOutcome, PhaseTimer};
