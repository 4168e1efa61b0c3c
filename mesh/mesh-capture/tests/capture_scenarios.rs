//! End-to-end capture scenarios.

use std::time::{Duration, Instant};

use mesh_capture::{
    AnchorId, CaptureError, CapturePhase, CaptureSession, DedupParams, ExportTarget, FragmentStore,
    IngestOutcome, ObjFileTarget, ProcessingParams, RegionParams, SessionParams, UpsertOutcome,
    deduplicate, filter_to_body_region, process_fragments,
};
use mesh_io::{IoError, IoResult, load_obj, parse_obj, to_obj_string};
use mesh_types::{IndexedMesh, Vertex};

fn verts(points: &[[f64; 3]]) -> Vec<Vertex> {
    points.iter().map(|&p| Vertex::from(p)).collect()
}

fn fragment_a() -> (AnchorId, Vec<Vertex>, Vec<[u32; 3]>) {
    (
        AnchorId::new(0xA),
        verts(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        vec![[0, 1, 2]],
    )
}

fn fragment_b() -> (AnchorId, Vec<Vertex>, Vec<[u32; 3]>) {
    (
        AnchorId::new(0xB),
        verts(&[[0.0, 0.0, 0.0005], [5.0, 5.0, 5.0]]),
        Vec::new(),
    )
}

fn fragment_c() -> (AnchorId, Vec<Vertex>, Vec<[u32; 3]>) {
    (
        AnchorId::new(0xC),
        verts(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        vec![[0, 1, 2]],
    )
}

fn assert_scenario_export(text: &str) {
    let v_lines = text.lines().filter(|l| l.starts_with("v ")).count();
    let f_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();

    assert_eq!(v_lines, 3);
    assert_eq!(f_lines, vec!["f 1 2 3", "f 1 2 3"]);
}

#[test]
fn three_fragment_scenario_through_pipeline() {
    let mut store = FragmentStore::new();
    for (id, v, f) in [fragment_a(), fragment_b(), fragment_c()] {
        store.upsert(id, v, f);
    }

    assert_eq!(store.len(), 2);
    assert!(!store.contains(AnchorId::new(0xB)));

    let report = process_fragments(store.all(), &ProcessingParams::default());

    assert_eq!(report.consolidated_vertices, 6);
    assert_eq!(report.consolidated_faces, 2);
    assert_eq!(report.dedup.unique_vertices, 3);
    assert_eq!(report.region.kept_vertices, 3);
    assert_eq!(report.mesh.faces, vec![[0, 1, 2], [0, 1, 2]]);

    let centroid = report.region.centroid.unwrap();
    assert!((centroid.x - 1.0 / 3.0).abs() < 1e-9);
    assert!((centroid.y - 1.0 / 3.0).abs() < 1e-9);
    assert!(centroid.z.abs() < 1e-9);

    assert_scenario_export(&to_obj_string(&report.mesh));
}

#[test]
fn three_fragment_scenario_through_session() {
    let mut session = CaptureSession::new(SessionParams::default());
    let t0 = Instant::now();
    let phase = Duration::from_secs(5);

    session.start_at(t0);
    session.poll_at(t0 + phase);
    assert_eq!(session.phase(), CapturePhase::FrontCapture);

    let (id, v, f) = fragment_a();
    assert_eq!(session.ingest(id, v, f), IngestOutcome::Inserted);

    session.poll_at(t0 + phase * 2);
    let (id, v, f) = fragment_b();
    assert_eq!(session.ingest(id, v, f), IngestOutcome::Rejected);

    session.poll_at(t0 + phase * 3);
    assert_eq!(session.phase(), CapturePhase::BackCapture);
    let (id, v, f) = fragment_c();
    assert_eq!(session.ingest(id, v, f), IngestOutcome::Inserted);

    session.poll_at(t0 + phase * 4);
    assert_eq!(session.wait_for_processing(), CapturePhase::Complete);
    assert!(session.is_exportable());

    assert_scenario_export(&session.export_text().unwrap());
}

#[test]
fn reingesting_anchor_keeps_latest_payload() {
    let mut store = FragmentStore::new();
    let id = AnchorId::new(42);

    let first = verts(&[[0.0, 0.0, 0.0], [0.2, 0.0, 0.0], [0.0, 0.2, 0.0]]);
    let second = verts(&[[0.0, 0.0, 0.3], [0.2, 0.0, 0.3], [0.0, 0.2, 0.3]]);

    assert_eq!(store.upsert(id, first, vec![[0, 1, 2]]), UpsertOutcome::Inserted);
    assert_eq!(store.upsert(id, second.clone(), vec![[0, 1, 2]]), UpsertOutcome::Replaced);

    let report = process_fragments(store.all(), &ProcessingParams::default());
    assert_eq!(report.mesh.vertices, second);
}

#[test]
fn dedup_tolerance_boundary() {
    let mut merges = IndexedMesh::from_parts(verts(&[[0.0; 3], [0.0009, 0.0, 0.0]]), Vec::new());
    let mut keeps = IndexedMesh::from_parts(verts(&[[0.0; 3], [0.0011, 0.0, 0.0]]), Vec::new());

    deduplicate(&mut merges, &DedupParams::default());
    deduplicate(&mut keeps, &DedupParams::default());

    assert_eq!(merges.vertices.len(), 1);
    assert_eq!(keeps.vertices.len(), 2);
}

#[test]
fn region_radius_boundary() {
    let mut mesh = IndexedMesh::from_parts(
        verts(&[
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0001, 0.0],
            [0.0, -1.0001, 0.0],
        ]),
        Vec::new(),
    );

    let result = filter_to_body_region(&mut mesh, &RegionParams::default());

    assert_eq!(result.kept_vertices, 2);
    assert_eq!(mesh.vertices, verts(&[[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]));
}

#[test]
fn region_filter_drops_faces_but_keeps_vertices() {
    let mut mesh = IndexedMesh::from_parts(
        verts(&[[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [3.0, 0.0, 0.0]]),
        vec![[0, 1, 2], [0, 1, 3]],
    );

    filter_to_body_region(&mut mesh, &RegionParams::default());

    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.faces, vec![[0, 1, 2]]);
}

#[test]
fn export_round_trip_reproduces_mesh() {
    let mesh = IndexedMesh::from_parts(
        verts(&[
            [0.1, 0.2, 0.3],
            [-1.0 / 3.0, 2.5e-7, 1e10],
            [0.7, -0.0, 123.456],
        ]),
        vec![[0, 1, 2], [2, 1, 0]],
    );

    let parsed = parse_obj(&to_obj_string(&mesh)).unwrap();
    assert_eq!(parsed.vertices.len(), mesh.vertices.len());
    assert_eq!(parsed.faces, mesh.faces);
    for (a, b) in parsed.vertices.iter().zip(&mesh.vertices) {
        assert_eq!(a.position, b.position);
    }
}

struct Rejecting;

impl ExportTarget for Rejecting {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn export(&self, _mesh: &IndexedMesh) -> IoResult<()> {
        Err(IoError::invalid_content(0, "destination refused mesh"))
    }
}

#[test]
fn session_exports_to_multiple_targets() {
    let dir = tempfile::tempdir().unwrap();
    let first = ObjFileTarget::new(dir.path().join("first.obj"));
    let second = ObjFileTarget::new(dir.path().join("second.obj"));

    let mut session = CaptureSession::new(
        SessionParams::default().with_phase_duration(Duration::from_millis(1)),
    );
    let t0 = Instant::now();
    session.start_at(t0);
    session.poll_at(t0 + Duration::from_millis(1));
    let (id, v, f) = fragment_a();
    session.ingest(id, v, f);
    session.poll_at(t0 + Duration::from_millis(4));
    session.wait_for_processing();

    let report = session.export_to(&[&first, &Rejecting, &second]).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failures().count(), 1);

    let a = load_obj(first.path()).unwrap();
    let b = load_obj(second.path()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.vertices.len(), 3);
    assert_eq!(Some(&a), session.final_mesh());

    match report.into_result() {
        Err(CaptureError::Export { target, .. }) => assert_eq!(target, "rejecting"),
        other => panic!("expected rejecting target to fail, got {other:?}"),
    }
}

#[test]
fn export_before_completion_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let target = ObjFileTarget::new(dir.path().join("early.obj"));
    let session = CaptureSession::default();

    let result = session.export_to(&[&target]);

    assert!(matches!(
        result,
        Err(CaptureError::NotExportable {
            phase: CapturePhase::Preparation
        })
    ));
    assert!(!target.path().exists());
}
