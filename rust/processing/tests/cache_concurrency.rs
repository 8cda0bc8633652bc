// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use opening_lite_geometry::{prism_along, Point3, Vector3};
use opening_lite_processing::{
    BuiltInCategory, CandidateElement, ElementId, ElementType, ElementTypeData, ElementTypeId,
    Location, RawCandidate, ScanConfig, SizingEngine, TypeSizeCache,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::path::PathBuf;

fn record(width: f64) -> ElementTypeData {
    ElementTypeData::new(
        BuiltInCategory::GenericModels,
        "Sleeve",
        "Type A",
        width,
        100.0,
        ElementTypeData::describe(width, 100.0),
    )
}

fn temp_snapshot(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("opening-lite-concurrency-{}-{}", std::process::id(), name))
        .join("type_sizes.json")
}

#[test]
fn concurrent_inserts_keep_exactly_one_value() {
    let cache = TypeSizeCache::in_memory();

    let observed: Vec<ElementTypeData> = (0..256)
        .into_par_iter()
        .map(|i| {
            cache
                .insert_if_absent("shared-type", record(100.0 + i as f64))
                .into_value()
        })
        .collect();

    let inserted = cache.get("shared-type").unwrap();
    assert_eq!(cache.len(), 1);
    assert!(observed.iter().all(|v| *v == inserted));
}

#[test]
fn concurrent_keys_do_not_interfere() {
    let cache = TypeSizeCache::in_memory();

    (0..64).into_par_iter().for_each(|k| {
        for attempt in 0..8 {
            cache.insert_if_absent(format!("type-{}", k), record(100.0 + attempt as f64));
        }
    });

    assert_eq!(cache.len(), 64);
    for k in 0..64 {
        assert_eq!(cache.get(&format!("type-{}", k)).unwrap().width, 100.0);
    }
}

#[test]
fn concurrent_sizing_of_one_type_agrees() {
    let config = ScanConfig {
        persist_cache_on_insert: false,
        ..ScanConfig::default()
    };
    let cache = TypeSizeCache::in_memory();
    let element_type = ElementType {
        id: ElementTypeId(1),
        unique_id: "sleeve".into(),
        category: BuiltInCategory::GenericModels,
        family_name: "Sleeve".into(),
        symbol_name: "Type A".into(),
    };

    let results: Vec<_> = (0..32)
        .into_par_iter()
        .map(|i| {
            let center = Point3::new(i as f64 * 1000.0, 100.0, 1500.0);
            let solid = prism_along(&center, &Vector3::y(), 330.0, 210.0, 200.0);
            let candidate = CandidateElement::from_raw(RawCandidate {
                id: ElementId(i),
                category: BuiltInCategory::GenericModels,
                type_id: ElementTypeId(1),
                location: Location::Curve {
                    start: center - Vector3::y(),
                    end: center + Vector3::y(),
                },
                solids: smallvec![solid.clone()],
                parameters: FxHashMap::default(),
            })
            .unwrap();
            SizingEngine::new(&config, &cache)
                .resolve_size(&element_type, &candidate, &solid, &Vector3::y())
                .unwrap()
        })
        .collect();

    assert_eq!(cache.len(), 1);
    let stored = cache.get("sleeve").unwrap();
    assert_eq!((stored.width, stored.height), (330.0, 210.0));
    assert!(results.iter().all(|r| r.data == stored));
    assert!(results.iter().all(|r| r.width == 430.0 && r.height == 310.0));
}

#[test]
fn concurrent_flushes_leave_a_readable_snapshot() {
    let path = temp_snapshot("flush");
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
    let cache = TypeSizeCache::with_path(&path);

    (0..32).into_par_iter().for_each(|k| {
        cache.insert_if_absent(format!("type-{}", k), record(150.0));
        cache.flush().unwrap();
    });

    let reloaded = TypeSizeCache::with_path(&path);
    assert_eq!(reloaded.load().unwrap(), 32);
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
