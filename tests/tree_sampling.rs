//! End-to-end sampling scenarios over in-memory fields: tree construction,
//! projector promotion, orbit switching and cache behavior working together.

use std::num::NonZeroUsize;
use std::sync::Arc;

use swathrs::{
    averaged, promote_projectors, BinaryFn, CachePolicy, Coord, DataNode, DataType, FieldCatalog,
    MemoryCatalog, MemoryField, Projection, Rect, Sample, UnaryFn,
};

const EPS: f64 = 1e-9;

/// Native grid: 1 meter per pixel, projected into common space at
/// half scale and offset 100 on the x axis.
fn projection() -> Projection {
    Projection::Affine {
        origin: Coord::new(100.0, 0.0),
        scale: Coord::new(0.5, 0.5),
    }
}

/// Two 2x2 blocks along x covering native x in [0, 4], y in [0, 2].
fn band(name: &str, blocks: [[u8; 4]; 2]) -> MemoryField {
    MemoryField::new(
        name,
        0,
        vec![Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(2.0, 0.0, 4.0, 2.0)],
        2,
        2,
        DataType::UInt8,
        vec![255],
        blocks.iter().map(|b| b.to_vec()).collect(),
    )
    .with_projection(projection())
}

fn red() -> MemoryField {
    band("red", [[10, 10, 10, 10], [20, 20, 20, 20]])
}

fn nir() -> MemoryField {
    band("nir", [[30, 30, 30, 30], [60, 60, 255, 60]])
}

fn ndvi_tree() -> Box<DataNode> {
    // (nir - red) / (nir + red)
    Box::new(DataNode::binary(
        BinaryFn::Div,
        DataNode::binary(
            BinaryFn::Sub,
            DataNode::projected_source(Arc::new(nir()), CachePolicy::Unbounded),
            DataNode::projected_source(Arc::new(red()), CachePolicy::Unbounded),
        ),
        DataNode::binary(
            BinaryFn::Add,
            DataNode::projected_source(Arc::new(nir()), CachePolicy::Unbounded),
            DataNode::projected_source(Arc::new(red()), CachePolicy::Unbounded),
        ),
    ))
}

#[test]
fn test_ndvi_pipeline_with_promotion() {
    let mut tree = ndvi_tree();
    promote_projectors(&mut tree);
    assert!(tree.check());

    // All four leaf projectors share parameters, so promotion leaves a
    // single projector at the root.
    let dump = tree.to_string();
    assert!(dump.lines().next().unwrap().starts_with("project "), "{dump}");
    assert_eq!(dump.matches("project").count(), 1, "{dump}");

    // Common (100.25, 0.25) is native (0.5, 0.5): nir 30, red 10.
    let sample = tree.value(Coord::new(100.25, 0.25));
    assert!((sample.data - 0.5).abs() < EPS, "got {}", sample.data);
    assert_eq!(sample.coverage, 1.0);

    // Common (101.75, 0.25) is native (3.5, 0.5), nir's fill pixel in the
    // second block.
    assert_eq!(tree.value(Coord::new(101.75, 0.25)), Sample::EMPTY);

    // Far outside the swath.
    assert_eq!(tree.value(Coord::new(0.0, 0.0)), Sample::EMPTY);
}

#[test]
fn test_promotion_preserves_pipeline_values() {
    let coords: Vec<Coord> = (0..40)
        .map(|i| Coord::new(99.9 + 0.06 * f64::from(i), 0.1 + 0.02 * f64::from(i)))
        .collect();

    let mut plain = ndvi_tree();
    let mut promoted = ndvi_tree();
    promote_projectors(&mut promoted);

    let before = plain.values(&coords);
    let after = promoted.values(&coords);
    assert_eq!(before, after);
}

#[test]
fn test_batch_matches_single_point() {
    let mut tree = ndvi_tree();
    promote_projectors(&mut tree);

    let coords = [
        Coord::new(100.25, 0.25),
        Coord::new(101.75, 0.25),
        Coord::new(101.9, 0.9),
        Coord::new(-50.0, 80.0),
    ];
    let batch = tree.values(&coords);
    for (coord, batched) in coords.iter().zip(&batch) {
        assert_eq!(*batched, tree.value(*coord), "at {coord:?}");
    }
}

#[test]
fn test_mask_bounds_all_coverage() {
    let mut tree = ndvi_tree();
    promote_projectors(&mut tree);
    let mask = tree.mask();
    assert!(!mask.is_empty());

    // Every covered query point must fall inside some mask polygon's
    // bounding box (the mask is conservative, not exact).
    for i in 0..80 {
        let coord = Coord::new(99.5 + 0.04 * f64::from(i), 0.5);
        if tree.value(coord).coverage == 0.0 {
            continue;
        }
        let inside = mask.iter().any(|polygon| {
            polygon.vertices().iter().any(|v| v.x <= coord.x)
                && polygon.vertices().iter().any(|v| v.x >= coord.x)
                && polygon.vertices().iter().any(|v| v.y <= coord.y)
                && polygon.vertices().iter().any(|v| v.y >= coord.y)
        });
        assert!(inside, "covered point {coord:?} outside every mask polygon");
    }
}

#[test]
fn test_classification_select_pipeline() {
    // A land/water classification raster gates a measurement band: only
    // class-2 pixels pass through.
    let classes = band("classes", [[1, 2, 1, 2], [2, 2, 2, 2]]);
    let measure = band("measure", [[11, 22, 33, 44], [55, 66, 77, 88]]);

    let mut tree = Box::new(DataNode::binary(
        BinaryFn::Select(2.0),
        DataNode::projected_source(Arc::new(classes), CachePolicy::Unbounded),
        DataNode::projected_source(Arc::new(measure), CachePolicy::Unbounded),
    ));
    promote_projectors(&mut tree);

    // Native (0.5, 0.5): class 1, masked out.
    assert_eq!(tree.value(Coord::new(100.25, 0.25)), Sample::EMPTY);
    // Native (0.5, 1.5): class 2, measurement 22 passes through.
    assert_eq!(tree.value(Coord::new(100.25, 0.75)), Sample::full(22.0));
}

#[test]
fn test_averaged_pipeline_spans_blocks() {
    // Uniform data everywhere pins the averaged value while the window
    // spans both blocks through the promoted projector.
    let field = band("uniform", [[40, 40, 40, 40], [40, 40, 40, 40]]);
    let node = DataNode::projected_source(Arc::new(field), CachePolicy::Unbounded);
    let mut tree = averaged(node, 1, 1.0);

    // Native center (2.0, 1.0) sits on the block seam. Window rows at
    // native y 0 and 1 land on valid pixels in both blocks; the row at
    // y 2 falls off the bottom edge, leaving six contributing points.
    let sample = tree.value(Coord::new(101.0, 0.5));
    assert!((sample.data - 40.0).abs() < EPS, "got {}", sample.data);
    assert!((sample.coverage - 6.0 / 9.0).abs() < EPS, "got {}", sample.coverage);
}

#[test]
fn test_orbit_switch_through_whole_tree() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(
        "band",
        501,
        Arc::new(band("band", [[10, 10, 10, 10], [10, 10, 10, 10]])),
    );
    catalog.insert(
        "band",
        502,
        Arc::new(band("band", [[90, 90, 90, 90], [90, 90, 90, 90]])),
    );
    let catalog: Arc<dyn FieldCatalog> = Arc::new(catalog);

    let source = DataNode::from_catalog(Arc::clone(&catalog), "band", 501, CachePolicy::Unbounded);
    let mut tree = Box::new(DataNode::unary(UnaryFn::Scale(2.0), source));
    assert!(tree.check());
    assert_eq!(tree.value(Coord::new(0.5, 0.5)), Sample::full(20.0));

    tree.set_orbit(502);
    assert!(tree.check());
    assert_eq!(tree.value(Coord::new(0.5, 0.5)), Sample::full(180.0));

    tree.set_orbit(999);
    assert!(!tree.check());
    assert_eq!(tree.value(Coord::new(0.5, 0.5)), Sample::EMPTY);
}

#[test]
fn test_bounded_cache_sampling_stays_correct() {
    // A strip of six blocks sampled through a two-block cache: eviction
    // must never change the values, only the read count.
    let rects: Vec<Rect> = (0..6)
        .map(|i| Rect::new(f64::from(i) * 2.0, 0.0, f64::from(i + 1) * 2.0, 2.0))
        .collect();
    let blocks: Vec<Vec<u8>> = (0..6u8).map(|i| vec![i * 10; 4]).collect();
    let field = Arc::new(MemoryField::new(
        "strip", 0, rects, 2, 2, DataType::UInt8, vec![255], blocks,
    ));

    let capacity = NonZeroUsize::new(2).expect("nonzero");
    let mut tree = DataNode::source(field.clone(), CachePolicy::Bounded(capacity));

    for pass in 0..2 {
        for i in 0..6 {
            let coord = Coord::new(f64::from(i) * 2.0 + 0.5, 0.5);
            let sample = tree.value(coord);
            assert_eq!(sample, Sample::full(f64::from(i) * 10.0), "pass {pass}, block {i}");
        }
    }

    // Sequential sweeps over six blocks never rehit the two resident
    // blocks, so every access costs a read.
    assert_eq!(field.read_count(), 12);
}
