//! Core mesh types for body scan capture.
//!
//! This crate provides the foundational types shared by the capture pipeline:
//!
//! - [`Vertex`] - A point in the capture session's world frame
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`Face`] - Three vertex indices into an [`IndexedMesh`]
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Mobile capture front-ends
//! - Servers
//! - Python bindings
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//! The capture pipeline defaults assume meters (a `0.001` weld tolerance is 1 mm).
//!
//! # Index Validity
//!
//! Every face index must be `< vertices.len()`. Operations that reorder or
//! drop vertices re-derive faces through a remapping and drop any face they
//! can't fully remap; [`IndexedMesh::has_valid_indices`] checks the invariant.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Vertex, IndexedMesh, Point3, MeshTopology};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(mesh.has_valid_indices());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod mesh;
mod traits;
mod vertex;

pub use mesh::{Face, IndexedMesh};
pub use traits::MeshTopology;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, Vector3};
