//! Per-anchor fragment storage.
//!
//! The tracking subsystem reports one partial mesh per surface anchor and
//! re-reports it whenever its estimate of that surface changes. Each report
//! supersedes the previous one for the same anchor; nothing accumulates.
//!
//! # Example
//!
//! ```
//! use mesh_capture::fragment::{AnchorId, FragmentStore, UpsertOutcome};
//! use mesh_types::Vertex;
//!
//! let mut store = FragmentStore::new();
//! let id = AnchorId::new(7);
//! let tri = vec![
//!     Vertex::from_coords(0.0, 0.0, 0.0),
//!     Vertex::from_coords(1.0, 0.0, 0.0),
//!     Vertex::from_coords(0.0, 1.0, 0.0),
//! ];
//!
//! assert_eq!(store.upsert(id, tri.clone(), vec![[0, 1, 2]]), UpsertOutcome::Inserted);
//! assert_eq!(store.upsert(id, tri, vec![[0, 2, 1]]), UpsertOutcome::Replaced);
//! assert_eq!(store.len(), 1);
//! ```

use std::fmt;

use hashbrown::HashMap;
use mesh_types::{Face, Isometry3, Vertex};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque, stable identity of a tracked surface anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnchorId(u128);

impl AnchorId {
    /// Wraps a raw identifier (e.g. the bytes of a tracker UUID).
    #[must_use]
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl From<u128> for AnchorId {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// One partial mesh captured from a single anchor, in world space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fragment {
    /// Anchor this geometry belongs to.
    pub identity: AnchorId,

    /// Vertex positions.
    pub vertices: Vec<Vertex>,

    /// Faces indexing into `vertices`.
    pub faces: Vec<Face>,
}

/// A raw geometry report from the tracking subsystem.
///
/// Geometry arrives in anchor-local coordinates together with the anchor's
/// pose; [`AnchorUpdate::into_world`] moves it into the shared world frame
/// that the rest of the pipeline assumes.
#[derive(Debug, Clone)]
pub struct AnchorUpdate {
    /// Anchor identity.
    pub identity: AnchorId,

    /// Anchor-local vertex positions.
    pub vertices: Vec<Vertex>,

    /// Faces indexing into `vertices`.
    pub faces: Vec<Face>,

    /// Anchor pose (local → world).
    pub transform: Isometry3<f64>,
}

impl AnchorUpdate {
    /// An update whose geometry is already in world space.
    #[must_use]
    pub fn new(identity: AnchorId, vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Self {
            identity,
            vertices,
            faces,
            transform: Isometry3::identity(),
        }
    }

    /// Sets the anchor pose.
    #[must_use]
    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Applies the anchor pose, yielding world-space geometry.
    #[must_use]
    pub fn into_world(self) -> (AnchorId, Vec<Vertex>, Vec<Face>) {
        let Self {
            identity,
            mut vertices,
            faces,
            transform,
        } = self;

        for v in &mut vertices {
            *v = v.transformed(&transform);
        }
        (identity, vertices, faces)
    }
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting of the anchor; appended.
    Inserted,
    /// Known anchor; its fragment was replaced in place.
    Replaced,
    /// Empty vertices or faces; the store is unchanged.
    Rejected,
}

/// Ordered map from anchor identity to its latest fragment.
///
/// Iteration follows first-seen order. Replacing a fragment keeps its slot,
/// so consolidation output is deterministic for a given event sequence.
#[derive(Debug, Clone, Default)]
pub struct FragmentStore {
    fragments: Vec<Fragment>,
    slots: HashMap<AnchorId, usize>,
}

impl FragmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the fragment for `identity`.
    ///
    /// An update with no vertices or no faces carries no usable surface and
    /// is discarded without touching any existing fragment.
    pub fn upsert(
        &mut self,
        identity: AnchorId,
        vertices: Vec<Vertex>,
        faces: Vec<Face>,
    ) -> UpsertOutcome {
        if vertices.is_empty() || faces.is_empty() {
            debug!(
                anchor = %identity,
                vertices = vertices.len(),
                faces = faces.len(),
                "Discarding fragment without geometry"
            );
            return UpsertOutcome::Rejected;
        }

        let fragment = Fragment {
            identity,
            vertices,
            faces,
        };

        if let Some(&slot) = self.slots.get(&identity) {
            self.fragments[slot] = fragment;
            UpsertOutcome::Replaced
        } else {
            self.slots.insert(identity, self.fragments.len());
            self.fragments.push(fragment);
            UpsertOutcome::Inserted
        }
    }

    /// Applies a raw tracker update after moving it into world space.
    pub fn apply(&mut self, update: AnchorUpdate) -> UpsertOutcome {
        let (identity, vertices, faces) = update.into_world();
        self.upsert(identity, vertices, faces)
    }

    /// Removes all fragments.
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.slots.clear();
    }

    /// All fragments in first-seen order.
    #[must_use]
    pub fn all(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Iterates over fragments in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Looks up the current fragment of an anchor.
    #[must_use]
    pub fn get(&self, identity: AnchorId) -> Option<&Fragment> {
        self.slots.get(&identity).map(|&slot| &self.fragments[slot])
    }

    /// Whether the anchor has a stored fragment.
    #[must_use]
    pub fn contains(&self, identity: AnchorId) -> bool {
        self.slots.contains_key(&identity)
    }

    /// Number of stored fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the store holds no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total vertices across all fragments.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.fragments.iter().map(|f| f.vertices.len()).sum()
    }

    /// Total faces across all fragments.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.fragments.iter().map(|f| f.faces.len()).sum()
    }

    /// Consumes the store, yielding fragments in first-seen order.
    #[must_use]
    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }
}
