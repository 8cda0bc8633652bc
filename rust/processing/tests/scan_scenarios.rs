// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use opening_lite_core::ParameterId;
use opening_lite_geometry::{box_solid, cylinder_along, prism_along, Aabb, Placement, Point3, Vector3};
use opening_lite_processing::{
    BuiltInCategory, CancellationToken, CollisionSession, ElementId, ElementType, ElementTypeId,
    Error, HostDocument, HostElement, HostKind, LevelHosts, LevelId, Location, MemoryDocument, OpeningDescriptor,
    OpeningShape, RawCandidate, ScanConfig,
};
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::cell::Cell;

const WALL: ElementId = ElementId(1);
const LEVEL: LevelId = LevelId(0);

fn config() -> ScanConfig {
    ScanConfig {
        persist_cache_on_insert: false,
        cache_path: None,
        ..ScanConfig::default()
    }
}

/// 4 m long, 200 mm thick wall facing +Y
fn wall(id: ElementId, level: LevelId, y0: f64) -> HostElement {
    HostElement {
        id,
        level_id: level,
        kind: HostKind::Wall {
            orientation: Vector3::y(),
        },
        solid: box_solid(&Aabb::new(
            Point3::new(0.0, y0, 0.0),
            Point3::new(4000.0, y0 + 200.0, 3000.0),
        )),
    }
}

fn element_type(id: i64, category: BuiltInCategory, unique_id: &str) -> ElementType {
    ElementType {
        id: ElementTypeId(id),
        unique_id: unique_id.into(),
        category,
        family_name: category.name().into(),
        symbol_name: "Standard".into(),
    }
}

fn pipe(id: i64, center: Point3<f64>, axis: Vector3<f64>, diameter: f64) -> RawCandidate {
    RawCandidate {
        id: ElementId(id),
        category: BuiltInCategory::Pipes,
        type_id: ElementTypeId(100),
        location: Location::Curve {
            start: center - axis * 600.0,
            end: center + axis * 600.0,
        },
        solids: smallvec![cylinder_along(&center, &axis, diameter, 1200.0, 24)],
        parameters: [(ParameterId::PipeOuterDiameter, diameter)].into_iter().collect(),
    }
}

fn duct(id: i64, center: Point3<f64>, axis: Vector3<f64>, width: f64, height: f64) -> RawCandidate {
    RawCandidate {
        id: ElementId(id),
        category: BuiltInCategory::Ducts,
        type_id: ElementTypeId(200),
        location: Location::Curve {
            start: center - axis * 500.0,
            end: center + axis * 500.0,
        },
        solids: smallvec![prism_along(&center, &axis, width, height, 1000.0)],
        parameters: [(ParameterId::DuctWidth, width), (ParameterId::DuctHeight, height)]
            .into_iter()
            .collect(),
    }
}

fn document() -> MemoryDocument {
    let mut doc = MemoryDocument::new("test model");
    doc.add_host(wall(WALL, LEVEL, 0.0))
        .add_type(element_type(100, BuiltInCategory::Pipes, "pipe-pvc"))
        .add_type(element_type(200, BuiltInCategory::Ducts, "duct-rect"))
        .add_type(element_type(300, BuiltInCategory::GenericModels, "sleeve-box"));
    doc
}

fn run(
    session: &CollisionSession,
    doc: &MemoryDocument,
    hosts: Vec<ElementId>,
    category: BuiltInCategory,
) -> Vec<OpeningDescriptor> {
    session
        .scan(doc, vec![LevelHosts::new(LEVEL, hosts)], category, CancellationToken::new())
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn round_pipe_through_wall_gives_one_padded_opening() {
    let mut doc = document();
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();

    let openings = run(&session, &doc, vec![WALL], BuiltInCategory::Pipes);

    assert_eq!(openings.len(), 1);
    let o = &openings[0];
    assert_eq!(o.host_id, WALL);
    assert_eq!(o.candidate_id, ElementId(10));
    assert_eq!(o.level_id, LEVEL);
    assert_eq!(o.width, 100.0 + 2.0 * 50.0);
    assert_eq!(o.height, 100.0 + 2.0 * 50.0);
    assert_eq!(o.description, "100x100(h)");
    assert_eq!(o.shape, OpeningShape::Round);
    assert_eq!(o.type_fingerprint, "pipe-pvc|D100");
    assert_relative_eq!(o.origin, Point3::new(1000.0, 100.0, 1500.0), epsilon = 1.0);
    assert_relative_eq!(o.host_normal, Vector3::y());
    assert_relative_eq!(o.run_direction, Vector3::y(), epsilon = 1e-12);
    assert!(!o.selected);
}

#[test]
fn reversed_pipe_gives_same_opening() {
    let mut doc = document();
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), -Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();

    let openings = run(&session, &doc, vec![WALL], BuiltInCategory::Pipes);
    assert_eq!(openings.len(), 1);
    assert_relative_eq!(openings[0].run_direction, Vector3::y(), epsilon = 1e-12);
    assert_eq!(openings[0].width, 200.0);
}

#[test]
fn duct_parallel_to_wall_face_gives_nothing() {
    let mut doc = document();
    doc.add_candidate(duct(20, Point3::new(2000.0, 100.0, 1500.0), Vector3::x(), 300.0, 300.0));
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL])],
        BuiltInCategory::Ducts,
        CancellationToken::new(),
    );
    assert!(scan.next().is_none());
    assert_eq!(scan.stats().candidates_tested, 1);
    assert_eq!(scan.stats().rejected_by_direction, 1);
    assert_eq!(scan.stats().emitted, 0);
}

#[test]
fn two_close_ducts_merge_into_one_opening() {
    let mut doc = document();
    // 300 mm ducts with a 10 mm gap
    doc.add_candidate(duct(30, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 300.0, 300.0))
        .add_candidate(duct(31, Point3::new(1310.0, 100.0, 1500.0), Vector3::y(), 300.0, 300.0));
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL])],
        BuiltInCategory::Ducts,
        CancellationToken::new(),
    );
    let openings: Vec<_> = scan.by_ref().map(|o| o.unwrap()).collect();

    assert_eq!(openings.len(), 1);
    let o = &openings[0];
    assert_eq!(o.candidate_id, ElementId(30));
    assert_eq!(o.merged_candidates, vec![ElementId(31)]);
    assert_eq!(o.description, "610x300(h)");
    assert_eq!(o.width, 710.0);
    assert_eq!(o.height, 400.0);
    assert_eq!(o.shape, OpeningShape::Rectangular);
    assert_relative_eq!(o.origin.x, 1155.0, epsilon = 1.0);
    assert_eq!(scan.stats().merged, 1);
    // Same duct type and size: sized once, then served from the cache
    assert_eq!(scan.stats().cache_misses, 1);
    assert_eq!(scan.stats().cache_hits, 1);
}

#[test]
fn distant_ducts_stay_separate() {
    let mut doc = document();
    doc.add_candidate(duct(30, Point3::new(800.0, 100.0, 1500.0), Vector3::y(), 300.0, 300.0))
        .add_candidate(duct(31, Point3::new(3000.0, 100.0, 1500.0), Vector3::y(), 300.0, 300.0));
    let session = CollisionSession::new(config()).unwrap();

    let openings = run(&session, &doc, vec![WALL], BuiltInCategory::Ducts);
    assert_eq!(openings.len(), 2);
    assert!(openings.iter().all(|o| o.width == 400.0 && !o.is_merged()));
}

#[test]
fn merge_is_per_host() {
    // Two walls back to back, one run through both
    let mut doc = document();
    doc.add_host(wall(ElementId(2), LEVEL, 200.0));
    doc.add_candidate(duct(30, Point3::new(1000.0, 200.0, 1500.0), Vector3::y(), 300.0, 300.0));
    let session = CollisionSession::new(config()).unwrap();

    let openings = run(&session, &doc, vec![WALL, ElementId(2)], BuiltInCategory::Ducts);
    assert_eq!(openings.len(), 2);
    assert_eq!(openings[0].host_id, WALL);
    assert_eq!(openings[1].host_id, ElementId(2));
}

#[test]
fn vertical_pipe_through_floor() {
    let mut doc = document();
    doc.add_host(HostElement {
        id: ElementId(5),
        level_id: LEVEL,
        kind: HostKind::Floor,
        solid: box_solid(&Aabb::new(
            Point3::new(0.0, 0.0, -250.0),
            Point3::new(6000.0, 6000.0, 0.0),
        )),
    });
    doc.add_candidate(pipe(40, Point3::new(2000.0, 2000.0, -125.0), Vector3::z(), 150.0));
    let session = CollisionSession::new(config()).unwrap();

    let openings = run(&session, &doc, vec![ElementId(5)], BuiltInCategory::Pipes);
    assert_eq!(openings.len(), 1);
    assert_relative_eq!(openings[0].host_normal, Vector3::z(), epsilon = 1e-9);
    assert_eq!(openings[0].description, "150x150(h)");
    assert_eq!(openings[0].width, 250.0);
}

#[test]
fn geometric_fallback_sizes_point_placed_element_once_per_type() {
    let mut doc = document();
    doc.add_host(wall(ElementId(2), LEVEL, 5000.0));
    for (id, y) in [(50, 100.0), (51, 5100.0)] {
        let center = Point3::new(2000.0, y, 1500.0);
        let placement = Placement::from_axes(center, Vector3::z(), Vector3::y()).unwrap();
        doc.add_candidate(RawCandidate {
            id: ElementId(id),
            category: BuiltInCategory::GenericModels,
            type_id: ElementTypeId(300),
            location: Location::Point(placement),
            solids: smallvec![prism_along(&center, &Vector3::y(), 420.0, 260.0, 600.0)],
            parameters: FxHashMap::default(),
        });
    }
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL, ElementId(2)])],
        BuiltInCategory::GenericModels,
        CancellationToken::new(),
    );
    let openings: Vec<_> = scan.by_ref().map(|o| o.unwrap()).collect();

    assert_eq!(openings.len(), 2);
    for o in &openings {
        assert_eq!(o.description, "420x260(h)");
        assert_eq!((o.width, o.height), (520.0, 360.0));
        assert_eq!(o.type_fingerprint, "sleeve-box");
    }
    assert_eq!(scan.stats().cache_misses, 1);
    assert_eq!(scan.stats().cache_hits, 1);
    assert_eq!(session.cache().len(), 1);
}

#[test]
fn oversize_opening_is_dropped() {
    let mut doc = document();
    doc.add_candidate(duct(60, Point3::new(2000.0, 100.0, 1500.0), Vector3::y(), 2000.0, 400.0));
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL])],
        BuiltInCategory::Ducts,
        CancellationToken::new(),
    );
    assert!(scan.next().is_none());
    assert_eq!(scan.stats().oversize_rejected, 1);
}

#[test]
fn host_on_other_level_is_skipped() {
    let mut doc = document();
    doc.add_host(wall(ElementId(7), LevelId(1), 0.0));
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![ElementId(7)])],
        BuiltInCategory::Pipes,
        CancellationToken::new(),
    );
    assert!(scan.next().is_none());
    assert_eq!(scan.stats().hosts_skipped, 1);
    assert_eq!(scan.stats().hosts_scanned, 0);
}

#[test]
fn every_opening_is_on_its_scanned_level() {
    let mut doc = document();
    doc.add_host(wall(ElementId(8), LevelId(1), 3000.0));
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0))
        .add_candidate(pipe(11, Point3::new(1000.0, 3100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();

    let levels = vec![
        LevelHosts::new(LEVEL, doc.hosts_on_level(LEVEL)),
        LevelHosts::new(LevelId(1), doc.hosts_on_level(LevelId(1))),
    ];
    let openings: Vec<_> = session
        .scan(&doc, levels, BuiltInCategory::Pipes, CancellationToken::new())
        .map(|o| o.unwrap())
        .collect();

    assert_eq!(openings.len(), 2);
    assert_eq!((openings[0].host_id, openings[0].level_id), (WALL, LEVEL));
    assert_eq!((openings[1].host_id, openings[1].level_id), (ElementId(8), LevelId(1)));
}

#[test]
fn unavailable_document_fails_the_scan() {
    let mut doc = document();
    doc.set_available(false);
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL])],
        BuiltInCategory::Pipes,
        CancellationToken::new(),
    );
    assert!(matches!(scan.next(), Some(Err(Error::DocumentUnavailable(_)))));
    assert!(scan.next().is_none());
}

#[test]
fn cancelled_before_start_reports_cancellation() {
    let mut doc = document();
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut scan = session.scan(&doc, vec![LevelHosts::new(LEVEL, vec![WALL])], BuiltInCategory::Pipes, cancel);
    assert!(matches!(scan.next(), Some(Err(Error::Cancelled))));
    assert!(scan.next().is_none());
}

#[test]
fn cancel_after_first_host_keeps_emitted_results() {
    let mut doc = document();
    doc.add_host(wall(ElementId(2), LEVEL, 5000.0));
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0))
        .add_candidate(pipe(11, Point3::new(1000.0, 5100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();
    let cancel = CancellationToken::new();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL, ElementId(2)])],
        BuiltInCategory::Pipes,
        cancel.clone(),
    );
    let first = scan.next().unwrap().unwrap();
    assert_eq!(first.host_id, WALL);

    cancel.cancel();
    assert!(scan.next().is_none());
    assert_eq!(scan.stats().hosts_scanned, 1);
    assert_eq!(scan.stats().emitted, 1);

    // A fresh scan starts over from the first host
    let again = run(&session, &doc, vec![WALL, ElementId(2)], BuiltInCategory::Pipes);
    assert_eq!(again.len(), 2);
}

#[test]
fn scan_is_lazy() {
    let mut doc = document();
    doc.add_host(wall(ElementId(2), LEVEL, 5000.0));
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0))
        .add_candidate(pipe(11, Point3::new(1000.0, 5100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL, ElementId(2)])],
        BuiltInCategory::Pipes,
        CancellationToken::new(),
    );
    assert_eq!(scan.stats().hosts_scanned, 0);
    scan.next().unwrap().unwrap();
    assert_eq!(scan.stats().hosts_scanned, 1);
}

#[test]
fn owned_cache_is_cleared_when_session_drops() {
    let mut doc = document();
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();
    run(&session, &doc, vec![WALL], BuiltInCategory::Pipes);

    let cache = session.cache().clone();
    assert_eq!(cache.len(), 1);
    drop(session);
    assert!(cache.is_empty());
}

#[test]
fn shared_cache_survives_session_drop() {
    let mut doc = document();
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let cache = std::sync::Arc::new(opening_lite_processing::TypeSizeCache::in_memory());

    {
        let session = CollisionSession::with_cache(
            config(),
            opening_lite_geometry::CsgKernel::new(),
            cache.clone(),
        )
        .unwrap();
        run(&session, &doc, vec![WALL], BuiltInCategory::Pipes);
    }
    assert_eq!(cache.len(), 1);
    assert!(cache.get("pipe-pvc|D100").is_some());
}

#[test]
fn selection_flag_is_caller_state() {
    let mut doc = document();
    doc.add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let session = CollisionSession::new(config()).unwrap();
    let mut openings = run(&session, &doc, vec![WALL], BuiltInCategory::Pipes);
    openings[0].toggle_selected();
    assert!(openings[0].selected);
}

/// Document that cancels the scan on its `cancel_on`-th type lookup,
/// i.e. while a host's candidates are still being processed
struct CancellingDocument {
    inner: MemoryDocument,
    cancel: CancellationToken,
    cancel_on: usize,
    lookups: Cell<usize>,
}

impl HostDocument for CancellingDocument {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn host_element(&self, id: ElementId) -> Option<HostElement> {
        self.inner.host_element(id)
    }

    fn candidates_in_box(&self, category: BuiltInCategory, bounds: &Aabb) -> Vec<ElementId> {
        self.inner.candidates_in_box(category, bounds)
    }

    fn candidate_element(&self, id: ElementId) -> Option<RawCandidate> {
        self.inner.candidate_element(id)
    }

    fn element_type(&self, id: ElementTypeId) -> Option<ElementType> {
        let n = self.lookups.get() + 1;
        self.lookups.set(n);
        if n == self.cancel_on {
            self.cancel.cancel();
        }
        self.inner.element_type(id)
    }
}

#[test]
fn cancel_inside_only_host_discards_it_and_reports_cancellation() {
    let mut inner = document();
    inner
        .add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0))
        .add_candidate(pipe(11, Point3::new(3000.0, 100.0, 1500.0), Vector3::y(), 100.0));
    let cancel = CancellationToken::new();
    let doc = CancellingDocument {
        inner,
        cancel: cancel.clone(),
        cancel_on: 1,
        lookups: Cell::new(0),
    };
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(&doc, vec![LevelHosts::new(LEVEL, vec![WALL])], BuiltInCategory::Pipes, cancel);
    assert!(matches!(scan.next(), Some(Err(Error::Cancelled))));
    assert!(scan.next().is_none());
    assert_eq!(scan.stats().candidates_tested, 1);
    assert_eq!(scan.stats().emitted, 0);
    assert_eq!(doc.lookups.get(), 1);
}

#[test]
fn cancel_inside_second_host_keeps_first_host_only() {
    let mut inner = document();
    inner.add_host(wall(ElementId(2), LEVEL, 5000.0));
    inner
        .add_candidate(pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0))
        .add_candidate(pipe(11, Point3::new(1000.0, 5100.0, 1500.0), Vector3::y(), 100.0))
        .add_candidate(pipe(12, Point3::new(3000.0, 5100.0, 1500.0), Vector3::y(), 100.0));
    let cancel = CancellationToken::new();
    let doc = CancellingDocument {
        inner,
        cancel: cancel.clone(),
        cancel_on: 2,
        lookups: Cell::new(0),
    };
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL, ElementId(2)])],
        BuiltInCategory::Pipes,
        cancel,
    );
    let results: Vec<_> = scan.by_ref().collect();

    assert_eq!(results.len(), 1);
    let first = results[0].as_ref().unwrap();
    assert_eq!((first.host_id, first.candidate_id), (WALL, ElementId(10)));
    assert_eq!(scan.stats().hosts_scanned, 2);
    assert_eq!(scan.stats().emitted, 1);
    assert_eq!(doc.lookups.get(), 2);
}

#[test]
fn missing_element_type_is_counted() {
    let mut doc = document();
    let mut orphan = pipe(10, Point3::new(1000.0, 100.0, 1500.0), Vector3::y(), 100.0);
    orphan.type_id = ElementTypeId(999);
    doc.add_candidate(orphan);
    let session = CollisionSession::new(config()).unwrap();

    let mut scan = session.scan(
        &doc,
        vec![LevelHosts::new(LEVEL, vec![WALL])],
        BuiltInCategory::Pipes,
        CancellationToken::new(),
    );
    assert!(scan.next().is_none());
    let stats = scan.stats();
    assert_eq!(stats.candidates_tested, 1);
    assert_eq!(stats.missing_type, 1);
    assert_eq!(stats.emitted, 0);
}
