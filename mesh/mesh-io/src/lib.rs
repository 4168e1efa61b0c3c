//! Mesh file I/O for captured body scans.
//!
//! The capture pipeline's only in-scope interchange format is plain-text
//! Wavefront OBJ:
//!
//! - [`to_obj_string`] / [`write_obj`] - render a mesh as OBJ text
//! - [`save_obj`] - write an OBJ file atomically (temp file + rename)
//! - [`parse_obj`] / [`load_obj`] - read OBJ text back, for round-trips
//!
//! Binary and archival formats are left to callers, which can wrap their own
//! writers around the same [`IndexedMesh`](mesh_types::IndexedMesh).
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_obj, save_obj};
//!
//! let mesh = load_obj("scan.obj").unwrap();
//! save_obj(&mesh, "copy.obj").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod obj;

pub use error::{IoError, IoResult};
pub use obj::{load_obj, parse_obj, save_obj, to_obj_string, write_obj};
