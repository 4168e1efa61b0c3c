//! Capture phases.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a capture session is in its guided workflow.
///
/// Phases only move forward, except for a reset back to
/// [`CapturePhase::Preparation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CapturePhase {
    /// Subject gets into position; nothing is recorded.
    #[default]
    Preparation,
    /// Recording the front of the body.
    FrontCapture,
    /// Recording the side of the body.
    SideCapture,
    /// Recording the back of the body.
    BackCapture,
    /// Fragments are being consolidated in the background.
    Processing,
    /// The final mesh is available.
    Complete,
}

impl CapturePhase {
    /// The phase that follows this one, or `None` from `Complete`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Preparation => Some(Self::FrontCapture),
            Self::FrontCapture => Some(Self::SideCapture),
            Self::SideCapture => Some(Self::BackCapture),
            Self::BackCapture => Some(Self::Processing),
            Self::Processing => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// Whether fragments are recorded in this phase.
    #[must_use]
    pub const fn is_capturing(self) -> bool {
        matches!(
            self,
            Self::FrontCapture | Self::SideCapture | Self::BackCapture
        )
    }

    /// Whether this phase ends when its time budget runs out.
    #[must_use]
    pub const fn is_timed(self) -> bool {
        matches!(
            self,
            Self::Preparation | Self::FrontCapture | Self::SideCapture | Self::BackCapture
        )
    }
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Preparation => "preparation",
            Self::FrontCapture => "front capture",
            Self::SideCapture => "side capture",
            Self::BackCapture => "back capture",
            Self::Processing => "processing",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}
