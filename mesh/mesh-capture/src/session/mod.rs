//! Guided capture session.
//!
//! A [`CaptureSession`] owns the fragment store and decides when geometry is
//! accepted and when the pipeline runs. Time only moves when the owner calls
//! [`CaptureSession::poll`]; every time-dependent method has an `_at` variant
//! taking an explicit [`Instant`] so callers (and tests) control the clock.
//!
//! ```text
//! Preparation ─5s─▶ FrontCapture ─5s─▶ SideCapture ─5s─▶ BackCapture ─5s─▶ Processing ─job─▶ Complete
//!      ▲                                                                                           │
//!      └──────────────────────────────── cancel / reset (from any phase) ◀─────────────────────────┘
//! ```
//!
//! Entering `Processing` moves the fragment store into a background thread
//! running [`process_fragments`]. The session keeps only the join handle;
//! cancelling drops it, so a late result has nowhere to land.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use mesh_capture::fragment::AnchorId;
//! use mesh_capture::session::{CapturePhase, CaptureSession, IngestOutcome};
//! use mesh_capture::SessionParams;
//! use mesh_types::Vertex;
//!
//! let mut session = CaptureSession::new(SessionParams::default());
//! let t0 = Instant::now();
//! session.start_at(t0);
//!
//! // Preparation is over after 5 s
//! session.poll_at(t0 + Duration::from_secs(5));
//! assert_eq!(session.phase(), CapturePhase::FrontCapture);
//!
//! let tri = vec![
//!     Vertex::from_coords(0.0, 0.0, 0.0),
//!     Vertex::from_coords(0.1, 0.0, 0.0),
//!     Vertex::from_coords(0.0, 0.1, 0.0),
//! ];
//! assert_eq!(
//!     session.ingest(AnchorId::new(1), tri, vec![[0, 1, 2]]),
//!     IngestOutcome::Inserted
//! );
//!
//! // Run out the capture phases, then wait for the pipeline
//! session.poll_at(t0 + Duration::from_secs(20));
//! assert_eq!(session.wait_for_processing(), CapturePhase::Complete);
//! assert_eq!(session.final_mesh().unwrap().faces.len(), 1);
//! ```

mod phase;
pub mod timer;

pub use phase::CapturePhase;
pub use timer::{CancelToken, PhaseTimer};

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mesh_io::to_obj_string;
use mesh_types::{Face, IndexedMesh, Vertex};
use tracing::{debug, info, warn};

use crate::error::{CaptureError, CaptureResult};
use crate::export::{ExportReport, ExportTarget, export_all};
use crate::fragment::{AnchorId, AnchorUpdate, FragmentStore, UpsertOutcome};
use crate::params::SessionParams;
use crate::pipeline::{ProcessingReport, process_fragments};

/// What the session did with an incoming fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New anchor stored.
    Inserted,
    /// Existing anchor's fragment replaced.
    Replaced,
    /// Update carried no geometry.
    Rejected,
    /// Session was not capturing; update dropped.
    Ignored,
}

impl From<UpsertOutcome> for IngestOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Inserted => Self::Inserted,
            UpsertOutcome::Replaced => Self::Replaced,
            UpsertOutcome::Rejected => Self::Rejected,
        }
    }
}

/// Phase state machine around a [`FragmentStore`].
#[derive(Debug)]
pub struct CaptureSession {
    params: SessionParams,
    phase: CapturePhase,
    store: FragmentStore,

    /// Live while a timed phase is running.
    timer: Option<PhaseTimer>,
    /// Start of the current running stretch of the phase.
    resumed_at: Option<Instant>,
    /// Time spent in the current phase before the last pause.
    elapsed: Duration,

    job: Option<JoinHandle<ProcessingReport>>,
    report: Option<ProcessingReport>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(SessionParams::default())
    }
}

impl CaptureSession {
    /// Creates an idle session in `Preparation`.
    #[must_use]
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            phase: CapturePhase::Preparation,
            store: FragmentStore::new(),
            timer: None,
            resumed_at: None,
            elapsed: Duration::ZERO,
            job: None,
            report: None,
        }
    }

    /// Session parameters.
    #[must_use]
    pub const fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Whether a timed phase is counting down.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Fragments gathered so far. Empty once processing has started.
    #[must_use]
    pub const fn fragments(&self) -> &FragmentStore {
        &self.store
    }

    /// Deadline of the pending phase timer, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.as_ref().and_then(PhaseTimer::deadline)
    }

    /// The pending phase timer, if any.
    #[must_use]
    pub const fn pending_timer(&self) -> Option<&PhaseTimer> {
        self.timer.as_ref()
    }

    /// Starts (or resumes) the current timed phase now.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Starts (or resumes) the current timed phase at `now`.
    ///
    /// A resumed phase gets the remainder of its budget. Ignored while already
    /// running, while processing and once complete.
    pub fn start_at(&mut self, now: Instant) {
        if self.is_running() || !self.phase.is_timed() {
            debug!(phase = %self.phase, "Ignoring start");
            return;
        }

        let remaining = self.params.phase_duration.saturating_sub(self.elapsed);
        self.timer = Some(PhaseTimer::schedule(now, remaining));
        self.resumed_at = Some(now);

        info!(
            phase = %self.phase,
            remaining_ms = remaining.as_millis(),
            "Capture running"
        );
    }

    /// Pauses the current timed phase now.
    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    /// Pauses the current timed phase at `now`, freezing its progress.
    ///
    /// The pending timer is cancelled; [`Self::start_at`] schedules a new one
    /// for the remaining budget.
    pub fn pause_at(&mut self, now: Instant) {
        let Some(timer) = self.timer.take() else {
            return;
        };
        timer.cancel();

        if let Some(resumed) = self.resumed_at.take() {
            self.elapsed += now.saturating_duration_since(resumed);
        }

        info!(
            phase = %self.phase,
            elapsed_ms = self.elapsed.as_millis(),
            "Capture paused"
        );
    }

    /// Returns to `Preparation`, discarding all fragments and any result.
    ///
    /// An in-flight consolidation keeps running but its result is dropped.
    pub fn reset(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if self.job.take().is_some() {
            warn!("Discarding in-flight consolidation result");
        }

        self.store.clear();
        self.report = None;
        self.resumed_at = None;
        self.elapsed = Duration::ZERO;

        info!(from = %self.phase, "Capture session reset");
        self.phase = CapturePhase::Preparation;
    }

    /// Same as [`Self::reset`].
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Drives timers and collects a finished job, using the current time.
    pub fn poll(&mut self) -> CapturePhase {
        self.poll_at(Instant::now())
    }

    /// Drives timers and collects a finished job as of `now`.
    ///
    /// Several phases can elapse in one call; each follow-up phase is timed
    /// from the previous deadline, not from `now`.
    pub fn poll_at(&mut self, now: Instant) -> CapturePhase {
        while let Some(deadline) = self
            .timer
            .as_ref()
            .filter(|t| t.is_due(now))
            .and_then(PhaseTimer::deadline)
        {
            self.advance(deadline);
        }

        if self.job.as_ref().is_some_and(JoinHandle::is_finished) {
            self.collect_job();
        }

        self.phase
    }

    /// Blocks until processing has finished.
    ///
    /// Returns immediately outside `Processing`.
    pub fn wait_for_processing(&mut self) -> CapturePhase {
        if self.job.is_some() {
            self.collect_job();
        }
        self.phase
    }

    /// Ingests world-space geometry for an anchor.
    pub fn ingest(
        &mut self,
        identity: AnchorId,
        vertices: Vec<Vertex>,
        faces: Vec<Face>,
    ) -> IngestOutcome {
        if !self.accepts_geometry() {
            debug!(anchor = %identity, phase = %self.phase, "Ignoring fragment outside capture");
            return IngestOutcome::Ignored;
        }
        self.store.upsert(identity, vertices, faces).into()
    }

    /// Ingests a raw tracker update, applying its anchor pose.
    pub fn ingest_update(&mut self, update: AnchorUpdate) -> IngestOutcome {
        if !self.accepts_geometry() {
            debug!(anchor = %update.identity, phase = %self.phase, "Ignoring update outside capture");
            return IngestOutcome::Ignored;
        }
        self.store.apply(update).into()
    }

    /// Whether updates are currently stored.
    #[must_use]
    pub const fn accepts_geometry(&self) -> bool {
        self.phase.is_capturing() && self.is_running()
    }

    /// Progress through the current phase, using the current time.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress_at(Instant::now())
    }

    /// Progress through the current phase as of `now`, in `0.0..=1.0`.
    ///
    /// Timed phases report elapsed over budget, `Processing` reports `0.0`
    /// and `Complete` reports `1.0`.
    #[must_use]
    pub fn progress_at(&self, now: Instant) -> f64 {
        match self.phase {
            CapturePhase::Processing => 0.0,
            CapturePhase::Complete => 1.0,
            _ => {
                let budget = self.params.phase_duration;
                if budget.is_zero() {
                    return 0.0;
                }
                let running = self
                    .resumed_at
                    .map_or(Duration::ZERO, |r| now.saturating_duration_since(r));
                ((self.elapsed + running).as_secs_f64() / budget.as_secs_f64()).clamp(0.0, 1.0)
            }
        }
    }

    /// Whether a final mesh is available.
    #[must_use]
    pub const fn is_exportable(&self) -> bool {
        matches!(self.phase, CapturePhase::Complete) && self.report.is_some()
    }

    /// The final mesh once complete.
    #[must_use]
    pub fn final_mesh(&self) -> Option<&IndexedMesh> {
        self.report.as_ref().map(|r| &r.mesh)
    }

    /// Pipeline statistics once complete.
    #[must_use]
    pub const fn report(&self) -> Option<&ProcessingReport> {
        self.report.as_ref()
    }

    /// Renders the final mesh as OBJ text.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotExportable`] before the session completes.
    pub fn export_text(&self) -> CaptureResult<String> {
        self.exportable_mesh().map(to_obj_string)
    }

    /// Exports the final mesh to every target concurrently.
    ///
    /// Individual target failures are reported in the returned
    /// [`ExportReport`].
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotExportable`] before the session completes.
    pub fn export_to(&self, targets: &[&dyn ExportTarget]) -> CaptureResult<ExportReport> {
        self.exportable_mesh().map(|mesh| export_all(mesh, targets))
    }

    fn exportable_mesh(&self) -> CaptureResult<&IndexedMesh> {
        match (&self.report, self.phase) {
            (Some(report), CapturePhase::Complete) => Ok(&report.mesh),
            _ => Err(CaptureError::NotExportable { phase: self.phase }),
        }
    }

    /// Moves to the next phase at `at`, the deadline that just passed.
    fn advance(&mut self, at: Instant) {
        self.timer = None;
        self.resumed_at = None;
        self.elapsed = Duration::ZERO;

        let Some(next) = self.phase.next() else {
            return;
        };
        info!(from = %self.phase, to = %next, fragments = self.store.len(), "Phase advanced");
        self.phase = next;

        if next.is_timed() {
            self.timer = Some(PhaseTimer::schedule(at, self.params.phase_duration));
            self.resumed_at = Some(at);
        } else if next == CapturePhase::Processing {
            self.begin_processing();
        }
    }

    fn begin_processing(&mut self) {
        let fragments = std::mem::take(&mut self.store).into_fragments();
        let params = self.params.processing.clone();

        info!(fragments = fragments.len(), "Starting consolidation");

        let spawned = thread::Builder::new()
            .name("mesh-consolidation".into())
            .spawn(move || process_fragments(&fragments, &params));

        match spawned {
            Ok(handle) => self.job = Some(handle),
            Err(e) => {
                warn!(error = %e, "Could not spawn consolidation, completing with an empty mesh");
                self.finish(ProcessingReport::default());
            }
        }
    }

    fn collect_job(&mut self) {
        let Some(handle) = self.job.take() else {
            return;
        };

        let report = handle.join().unwrap_or_else(|_| {
            warn!("Consolidation panicked, completing with an empty mesh");
            ProcessingReport::default()
        });
        self.finish(report);
    }

    fn finish(&mut self, report: ProcessingReport) {
        info!(
            vertices = report.mesh.vertices.len(),
            faces = report.mesh.faces.len(),
            "Processing complete"
        );
        self.report = Some(report);
        self.phase = CapturePhase::Complete;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ProcessingParams;

    const PHASE: Duration = Duration::from_secs(5);

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn tri(offset: f64) -> Vec<Vertex> {
        vec![
            Vertex::from_coords(offset, 0.0, 0.0),
            Vertex::from_coords(offset + 0.1, 0.0, 0.0),
            Vertex::from_coords(offset, 0.1, 0.0),
        ]
    }

    fn started() -> (CaptureSession, Instant) {
        let mut session = CaptureSession::default();
        let t0 = Instant::now();
        session.start_at(t0);
        (session, t0)
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = CaptureSession::default();
        assert_eq!(session.phase(), CapturePhase::Preparation);
        assert!(!session.is_running());
        assert!(!session.is_exportable());
        assert!(session.next_deadline().is_none());
    }

    #[test]
    fn test_timed_advancement() {
        let (mut session, t0) = started();

        assert_eq!(session.poll_at(t0 + secs(4.9)), CapturePhase::Preparation);
        assert_eq!(session.poll_at(t0 + PHASE), CapturePhase::FrontCapture);
        assert_eq!(session.poll_at(t0 + PHASE * 2), CapturePhase::SideCapture);
        assert_eq!(session.poll_at(t0 + PHASE * 3), CapturePhase::BackCapture);
        assert_eq!(session.next_deadline(), Some(t0 + PHASE * 4));
    }

    #[test]
    fn test_late_poll_catches_up_from_deadlines() {
        let (mut session, t0) = started();

        assert_eq!(session.poll_at(t0 + secs(11.0)), CapturePhase::SideCapture);
        assert_eq!(session.next_deadline(), Some(t0 + PHASE * 3));
        assert!((session.progress_at(t0 + secs(11.0)) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_progress_tracks_elapsed_time() {
        let (session, t0) = started();
        assert!(session.progress_at(t0).abs() < 1e-9);
        assert!((session.progress_at(t0 + secs(2.5)) - 0.5).abs() < 1e-9);
        assert!((session.progress_at(t0 + secs(30.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_freezes_progress() {
        let (mut session, t0) = started();
        session.pause_at(t0 + secs(2.0));

        assert!(!session.is_running());
        assert!((session.progress_at(t0 + secs(60.0)) - 0.4).abs() < 1e-9);
        assert_eq!(session.poll_at(t0 + secs(60.0)), CapturePhase::Preparation);
    }

    #[test]
    fn test_resume_uses_remaining_budget() {
        let (mut session, t0) = started();
        session.pause_at(t0 + secs(2.0));
        session.start_at(t0 + secs(10.0));

        assert_eq!(session.next_deadline(), Some(t0 + secs(13.0)));
        assert!((session.progress_at(t0 + secs(11.0)) - 0.6).abs() < 1e-9);
        assert_eq!(session.poll_at(t0 + secs(12.9)), CapturePhase::Preparation);
        assert_eq!(session.poll_at(t0 + secs(13.0)), CapturePhase::FrontCapture);
    }

    #[test]
    fn test_stale_timer_never_fires() {
        let (mut session, t0) = started();
        let stale = session.pending_timer().cloned().unwrap();

        session.pause_at(t0 + secs(1.0));
        assert!(stale.is_cancelled());
        assert!(!stale.is_due(t0 + PHASE));

        session.start_at(t0 + secs(3.0));
        let stale = session.pending_timer().cloned().unwrap();
        session.cancel();
        assert!(!stale.is_due(t0 + secs(100.0)));
        assert_eq!(session.poll_at(t0 + secs(100.0)), CapturePhase::Preparation);
    }

    #[test]
    fn test_ingestion_only_while_capturing() {
        let (mut session, t0) = started();

        assert_eq!(
            session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]),
            IngestOutcome::Ignored
        );

        session.poll_at(t0 + PHASE);
        assert_eq!(
            session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]),
            IngestOutcome::Inserted
        );
        assert_eq!(
            session.ingest(AnchorId::new(1), tri(0.2), vec![[0, 1, 2]]),
            IngestOutcome::Replaced
        );
        assert_eq!(
            session.ingest(AnchorId::new(2), tri(0.0), Vec::new()),
            IngestOutcome::Rejected
        );

        session.pause_at(t0 + secs(6.0));
        assert_eq!(
            session.ingest(AnchorId::new(3), tri(0.0), vec![[0, 1, 2]]),
            IngestOutcome::Ignored
        );
        assert_eq!(session.fragments().len(), 1);
    }

    #[test]
    fn test_ingest_update_applies_pose() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE);

        let pose = mesh_types::Isometry3::translation(0.0, 0.0, 0.5);
        let update = AnchorUpdate::new(AnchorId::new(9), tri(0.0), vec![[0, 1, 2]])
            .with_transform(pose);
        assert_eq!(session.ingest_update(update), IngestOutcome::Inserted);

        let stored = session.fragments().get(AnchorId::new(9)).unwrap();
        assert!((stored.vertices[0].position.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_full_run_reaches_complete() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE);
        session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]);
        session.poll_at(t0 + PHASE * 2);
        session.ingest(AnchorId::new(2), tri(0.0), vec![[0, 1, 2]]);

        let phase = session.poll_at(t0 + PHASE * 4);
        assert!(matches!(phase, CapturePhase::Processing | CapturePhase::Complete));
        assert!(session.fragments().is_empty());
        assert!(!session.is_running());

        assert_eq!(session.wait_for_processing(), CapturePhase::Complete);
        assert!(session.is_exportable());
        assert!((session.progress_at(t0 + PHASE * 5) - 1.0).abs() < 1e-9);

        let report = session.report().unwrap();
        assert_eq!(report.fragment_count, 2);
        assert_eq!(report.mesh.vertices.len(), 3);
        assert_eq!(report.mesh.faces.len(), 2);
    }

    #[test]
    fn test_processing_progress_is_zero() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE * 4);
        if session.phase() == CapturePhase::Processing {
            assert!(session.progress_at(t0 + PHASE * 4).abs() < 1e-9);
        }
        session.wait_for_processing();
    }

    #[test]
    fn test_empty_capture_completes_with_empty_mesh() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE * 4);
        session.wait_for_processing();

        assert!(session.is_exportable());
        assert!(session.final_mesh().unwrap().vertices.is_empty());
    }

    #[test]
    fn test_start_ignored_once_complete() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE * 4);
        session.wait_for_processing();

        session.start_at(t0 + PHASE * 5);
        assert_eq!(session.phase(), CapturePhase::Complete);
        assert!(!session.is_running());
    }

    #[test]
    fn test_cancel_during_processing_discards_result() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE);
        session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]);
        session.poll_at(t0 + PHASE * 4);

        session.cancel();
        assert_eq!(session.phase(), CapturePhase::Preparation);
        assert!(!session.is_exportable());
        assert!(session.report().is_none());

        // A late job can no longer surface
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(session.poll_at(t0 + PHASE * 5), CapturePhase::Preparation);
        assert!(session.report().is_none());
    }

    #[test]
    fn test_reset_after_complete() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE);
        session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]);
        session.poll_at(t0 + PHASE * 4);
        session.wait_for_processing();

        session.reset();
        assert_eq!(session.phase(), CapturePhase::Preparation);
        assert!(session.final_mesh().is_none());
        assert!(session.progress_at(t0 + PHASE * 6).abs() < 1e-9);
        assert!(matches!(
            session.export_text(),
            Err(CaptureError::NotExportable {
                phase: CapturePhase::Preparation
            })
        ));
    }

    #[test]
    fn test_reset_clears_fragments() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE);
        session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]);

        session.reset();
        assert!(session.fragments().is_empty());
        assert!(!session.is_running());
    }

    #[test]
    fn test_export_text_before_complete_fails() {
        let (session, _) = started();
        assert!(matches!(
            session.export_text(),
            Err(CaptureError::NotExportable {
                phase: CapturePhase::Preparation
            })
        ));
    }

    #[test]
    fn test_export_text_after_complete() {
        let (mut session, t0) = started();
        session.poll_at(t0 + PHASE);
        session.ingest(AnchorId::new(1), tri(0.0), vec![[0, 1, 2]]);
        session.poll_at(t0 + PHASE * 4);
        session.wait_for_processing();

        let text = session.export_text().unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 3);
        assert!(text.lines().any(|l| l == "f 1 2 3"));
    }

    #[test]
    fn test_unbounded_phase_duration_never_advances() {
        let mut session =
            CaptureSession::new(SessionParams::default().with_phase_duration(Duration::MAX));
        let t0 = Instant::now();
        session.start_at(t0);

        assert!(session.is_running());
        assert!(session.next_deadline().is_none());
        assert_eq!(session.poll_at(t0 + secs(3600.0)), CapturePhase::Preparation);
        assert!(session.progress_at(t0 + secs(3600.0)) < 1e-9);

        session.pause_at(t0 + secs(10.0));
        session.start_at(t0 + secs(20.0));
        assert!(session.next_deadline().is_none());
        assert_eq!(session.poll_at(t0 + secs(7200.0)), CapturePhase::Preparation);
    }

    #[test]
    fn test_zero_duration_runs_straight_to_processing() {
        let params = SessionParams::default()
            .with_phase_duration(Duration::ZERO)
            .with_processing(ProcessingParams::naive());
        let mut session = CaptureSession::new(params);
        let t0 = Instant::now();
        session.start_at(t0);

        let phase = session.poll_at(t0);
        assert!(matches!(phase, CapturePhase::Processing | CapturePhase::Complete));
        assert_eq!(session.wait_for_processing(), CapturePhase::Complete);
    }
}
