//! Vertex type.

use nalgebra::{Isometry3, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A vertex in the capture session's world frame.
///
/// Scan fragments carry positions only; normals and texture coordinates are
/// not produced by the capture pipeline.
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// let v1 = Vertex::new(Point3::new(1.0, 2.0, 3.0));
/// let v2 = Vertex::from_coords(1.0, 2.0, 3.0);
///
/// assert_eq!(v1, v2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.x, 1.0);
    /// assert_eq!(v.position.y, 2.0);
    /// assert_eq!(v.position.z, 3.0);
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Euclidean distance to another vertex.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Vertex;
    ///
    /// let a = Vertex::from_coords(0.0, 0.0, 0.0);
    /// let b = Vertex::from_coords(3.0, 4.0, 0.0);
    /// assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    /// ```
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }

    /// Return this vertex moved by a rigid transform.
    #[inline]
    #[must_use]
    pub fn transformed(&self, transform: &Isometry3<f64>) -> Self {
        Self::new(transform.transform_point(&self.position))
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}

impl From<(f64, f64, f64)> for Vertex {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::from_coords(x, y, z)
    }
}
