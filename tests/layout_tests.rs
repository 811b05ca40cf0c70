//! Integration tests for the cluster grid layout.
//!
//! Images are tiny solid-colour buffers so every cell can be checked by
//! sampling a single pixel.

use std::collections::BTreeMap;

use imagecluster_core::{
    annotations, estimate_bytes, Annotation, Error, FeedbackLedger, IdentityPolicy, ImageMap,
    LayoutConfig, LayoutEngine, Partition, PixelBuffer,
};

const WHITE: [u8; 3] = [255, 255, 255];

// ─── helpers ─────────────────────────────────────────────────────────────────

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Solid colour derived from the name so cells can be told apart.
fn colour_of(name: &str) -> [u8; 3] {
    let b = name.as_bytes()[0];
    [b, b.wrapping_mul(3), 7]
}

fn solid_images(names: &[&str], h: usize, w: usize) -> ImageMap {
    let mut m = ImageMap::new();
    for n in names {
        m.insert(n.to_string(), PixelBuffer::filled(w, h, colour_of(n)).unwrap());
    }
    m
}

fn engine(padding: usize, max_cluster_size: Option<usize>, mem_limit: u64) -> LayoutEngine {
    LayoutEngine::new(LayoutConfig {
        padding,
        max_cluster_size,
        mem_limit,
        ..LayoutConfig::default()
    })
}

/// `{2: [[a, b]], 3: [[c, d, e]]}`
fn two_three_partition() -> Partition {
    let mut groups = BTreeMap::new();
    groups.insert(2, vec![ids(&["a", "b"])]);
    groups.insert(3, vec![ids(&["c", "d", "e"])]);
    Partition::from_groups(groups)
}

// ─── scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_two_and_three_cluster_scenario() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "d", "e"], 10, 10);
    let layout = engine(0, None, u64::MAX).render(&partition, &images).unwrap();

    assert_eq!(layout.raster.height(), 30);
    assert_eq!(layout.raster.width(), 20);
    assert_eq!(layout.rows, 3);

    // Column 0 is the size-2 cluster: a, b, then background.
    assert_eq!(layout.raster.pixel(5, 5), Some(colour_of("a")));
    assert_eq!(layout.raster.pixel(5, 15), Some(colour_of("b")));
    assert_eq!(layout.raster.pixel(5, 25), Some(WHITE));
    assert_eq!(layout.raster.pixel(0, 20), Some(WHITE));
    assert_eq!(layout.raster.pixel(9, 29), Some(WHITE));

    // Column 1 is the size-3 cluster.
    assert_eq!(layout.raster.pixel(15, 5), Some(colour_of("c")));
    assert_eq!(layout.raster.pixel(15, 15), Some(colour_of("d")));
    assert_eq!(layout.raster.pixel(15, 25), Some(colour_of("e")));

    let p = &layout.placements;
    assert_eq!(p.len(), 2);
    assert_eq!((p[0].column, p[0].display_index, p[0].size), (0, 1, 2));
    assert_eq!((p[0].x_start, p[0].x_end, p[0].filled_rows), (0, 10, 2));
    assert_eq!((p[1].column, p[1].display_index, p[1].size), (1, 2, 3));
    assert_eq!((p[1].x_start, p[1].x_end, p[1].filled_rows), (10, 20, 3));
    assert_eq!(p[1].members, ids(&["c", "d", "e"]));
}

#[test]
fn test_capacity_exceeded_reports_formula_exactly() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "d", "e"], 10, 10);
    let expected = 3 * 10 * (2 * 10 + 0) * 3;
    assert_eq!(estimate_bytes(3, 2, (10, 10), 0), expected);

    match engine(0, None, expected - 1).render(&partition, &images) {
        Err(Error::CapacityExceeded { estimated, limit }) => {
            assert_eq!(estimated, expected);
            assert_eq!(limit, expected - 1);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other.map(|l| l.placements)),
    }

    // Exactly at the limit is fine.
    assert!(engine(0, None, expected).render(&partition, &images).is_ok());
}

#[test]
fn test_budget_boundary_with_padding() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "d", "e"], 4, 6);
    let est = estimate_bytes(3, 2, (4, 6), 20);
    assert_eq!(est, 3 * 4 * (2 * 6 + 2 * 20) * 3);

    let plan_ok = engine(20, None, est).plan(&partition, &images).unwrap();
    assert_eq!(plan_ok.estimated_bytes, est);
    // The real canvas never exceeds the estimate.
    assert!((plan_ok.canvas_width() * plan_ok.canvas_height() * 3) as u64 <= est);

    assert!(matches!(
        engine(20, None, est - 1).plan(&partition, &images),
        Err(Error::CapacityExceeded { .. })
    ));
}

#[test]
fn test_grid_dimensions_with_padding() {
    // N = 4 clusters, R = 3.
    let partition = Partition::from_clusters(vec![
        ids(&["a"]),
        ids(&["b", "c"]),
        ids(&["d", "e", "f"]),
        ids(&["g", "h"]),
    ]);
    let images = solid_images(&["a", "b", "c", "d", "e", "f", "g", "h"], 5, 8);
    let layout = engine(20, None, u64::MAX).render(&partition, &images).unwrap();

    assert_eq!(layout.raster.width(), 4 * 8 + 3 * 20);
    assert_eq!(layout.raster.height(), 3 * 5);

    // Size order: [a], [b,c], [g,h], [d,e,f]
    let firsts: Vec<&str> = layout
        .placements
        .iter()
        .map(|p| p.members[0].as_str())
        .collect();
    assert_eq!(firsts, ["a", "b", "g", "d"]);
    let starts: Vec<usize> = layout.placements.iter().map(|p| p.x_start).collect();
    assert_eq!(starts, [0, 28, 56, 84]);

    // Padding gap between column 0 and 1 is background on every row.
    for y in 0..layout.raster.height() {
        assert_eq!(layout.raster.pixel(8, y), Some(WHITE));
        assert_eq!(layout.raster.pixel(27, y), Some(WHITE));
    }
}

#[test]
fn test_max_cluster_size_excludes_whole_clusters() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "d", "e"], 10, 10);
    let layout = engine(0, Some(2), u64::MAX).render(&partition, &images).unwrap();
    assert_eq!(layout.placements.len(), 1);
    assert_eq!(layout.raster.width(), 10);
    assert_eq!(layout.raster.height(), 20);

    assert!(matches!(
        engine(0, Some(1), u64::MAX).render(&partition, &images),
        Err(Error::EmptyInput)
    ));
}

#[test]
fn test_excluded_clusters_do_not_need_images() {
    let partition = two_three_partition();
    // Only the size-2 cluster's images are available.
    let images = solid_images(&["a", "b"], 10, 10);
    assert!(engine(0, Some(2), u64::MAX).render(&partition, &images).is_ok());
}

#[test]
fn test_empty_partition() {
    let images = solid_images(&["a"], 2, 2);
    assert!(matches!(
        engine(20, None, u64::MAX).render(&Partition::new(), &images),
        Err(Error::EmptyInput)
    ));
}

#[test]
fn test_inconsistent_shape() {
    let partition = two_three_partition();
    let mut images = solid_images(&["a", "b", "c", "d"], 10, 10);
    images.insert("e".to_string(), PixelBuffer::filled(12, 10, colour_of("e")).unwrap());
    match engine(0, None, u64::MAX).render(&partition, &images) {
        Err(Error::InconsistentShape {
            id,
            expected,
            found,
        }) => {
            assert_eq!(id, "e");
            assert_eq!(expected, (10, 10));
            assert_eq!(found, (10, 12));
        }
        other => panic!("expected InconsistentShape, got {:?}", other.map(|l| l.rows)),
    }
}

#[test]
fn test_missing_image() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "e"], 10, 10);
    match engine(0, None, u64::MAX).render(&partition, &images) {
        Err(Error::MissingImage { id }) => assert_eq!(id, "d"),
        other => panic!("expected MissingImage, got {:?}", other.map(|l| l.rows)),
    }
}

#[test]
fn test_custom_background() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "d", "e"], 2, 2);
    let layout = LayoutEngine::new(LayoutConfig {
        padding: 1,
        background: [0, 0, 0],
        ..LayoutConfig::default()
    })
    .render(&partition, &images)
    .unwrap();
    assert_eq!(layout.raster.pixel(2, 0), Some([0, 0, 0]));
    assert_eq!(layout.raster.pixel(0, 5), Some([0, 0, 0]));
}

#[test]
fn test_annotations_carry_ledger_confidence() {
    let partition = two_three_partition();
    let images = solid_images(&["a", "b", "c", "d", "e"], 10, 10);
    let layout = engine(20, None, u64::MAX).render(&partition, &images).unwrap();

    let identity = IdentityPolicy::ContentHash;
    let mut ledger = FeedbackLedger::new();
    let c = identity.cluster_id(&layout.placements[1].members, 2);
    ledger.record(c, true, 0);
    ledger.record(c, true, 1);
    ledger.record(c, false, 2);

    let overlay = annotations(&layout, |p| {
        Some(ledger.confidence(identity.cluster_id(&p.members, p.display_index)))
    });
    let labels: Vec<&str> = overlay
        .iter()
        .filter_map(|a| match a {
            Annotation::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, ["1 (0.50)", "2 (0.67)"]);
}
