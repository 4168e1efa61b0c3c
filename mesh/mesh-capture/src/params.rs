//! Configuration for the consolidation pipeline and capture session.
//!
//! All defaults reproduce the fixed constants of the capture workflow:
//! a 1 mm weld tolerance, a 1 m body-region radius, and 5 s per timed phase.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How near-coincident vertices are searched during deduplication.
///
/// Both strategies produce identical merge decisions; they differ only in cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DedupStrategy {
    /// Compare each vertex against every unique vertex so far. O(n²).
    Naive,

    /// Spatial hash over unique vertices, probing the 27 neighbouring cells.
    #[default]
    Grid,
}

/// Parameters for vertex deduplication.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DedupParams {
    /// Vertices closer than this (strictly) are merged. Default: 0.001.
    pub tolerance: f64,

    /// Search strategy. Default: [`DedupStrategy::Grid`].
    pub strategy: DedupStrategy,
}

impl Default for DedupParams {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            strategy: DedupStrategy::Grid,
        }
    }
}

impl DedupParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the merge tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the search strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: DedupStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Default tolerance with the reference nested scan.
    #[must_use]
    pub const fn naive() -> Self {
        Self {
            tolerance: 0.001,
            strategy: DedupStrategy::Naive,
        }
    }
}

/// Parameters for the body-region filter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionParams {
    /// Vertices farther than this from the centroid are dropped. Default: 1.0.
    pub radius: f64,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self { radius: 1.0 }
    }
}

impl RegionParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the acceptance radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

/// Parameters for one consolidation run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessingParams {
    /// Deduplication settings.
    pub dedup: DedupParams,

    /// Region filter settings.
    pub region: RegionParams,
}

impl ProcessingParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deduplication parameters.
    #[must_use]
    pub fn with_dedup(mut self, dedup: DedupParams) -> Self {
        self.dedup = dedup;
        self
    }

    /// Sets the region filter parameters.
    #[must_use]
    pub fn with_region(mut self, region: RegionParams) -> Self {
        self.region = region;
        self
    }

    /// Defaults, but deduplicating with the nested scan.
    #[must_use]
    pub fn naive() -> Self {
        Self {
            dedup: DedupParams::naive(),
            region: RegionParams::default(),
        }
    }
}

/// Parameters for a capture session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionParams {
    /// Time budget of each timed phase. Default: 5 s.
    pub phase_duration: Duration,

    /// Pipeline settings used when capture ends.
    pub processing: ProcessingParams,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            phase_duration: Duration::from_secs(5),
            processing: ProcessingParams::default(),
        }
    }
}

impl SessionParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-phase time budget.
    #[must_use]
    pub fn with_phase_duration(mut self, duration: Duration) -> Self {
        self.phase_duration = duration;
        self
    }

    /// Sets the pipeline parameters.
    #[must_use]
    pub fn with_processing(mut self, processing: ProcessingParams) -> Self {
        self.processing = processing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_capture_constants() {
        let params = SessionParams::default();
        assert_eq!(params.phase_duration, Duration::from_secs(5));
        assert!((params.processing.dedup.tolerance - 0.001).abs() < f64::EPSILON);
        assert!((params.processing.region.radius - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.processing.dedup.strategy, DedupStrategy::Grid);
    }

    #[test]
    fn test_builders() {
        let params = SessionParams::new()
            .with_phase_duration(Duration::from_millis(250))
            .with_processing(
                ProcessingParams::new()
                    .with_dedup(DedupParams::new().with_tolerance(0.01))
                    .with_region(RegionParams::new().with_radius(2.0)),
            );

        assert_eq!(params.phase_duration, Duration::from_millis(250));
        assert!((params.processing.dedup.tolerance - 0.01).abs() < f64::EPSILON);
        assert!((params.processing.region.radius - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_naive_preset() {
        let params = ProcessingParams::naive();
        assert_eq!(params.dedup.strategy, DedupStrategy::Naive);
        assert!((params.dedup.tolerance - 0.001).abs() < f64::EPSILON);
    }
}
