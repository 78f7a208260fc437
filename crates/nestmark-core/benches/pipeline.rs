use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use nestmark_core::{approximate_polygon, perimeter, ContourHierarchy, ContourPoint, PatternDetector};

/// Border of an axis-aligned square with one point per pixel step.
fn dense_square(cx: i32, cy: i32, side: i32) -> Vec<ContourPoint> {
    let (x0, y0) = (cx - side / 2, cy - side / 2);
    let mut pts = Vec::with_capacity(4 * side as usize);
    for x in x0..x0 + side {
        pts.push(Point2::new(x, y0));
    }
    for y in y0..y0 + side {
        pts.push(Point2::new(x0 + side, y));
    }
    for x in (x0 + 1..=x0 + side).rev() {
        pts.push(Point2::new(x, y0 + side));
    }
    for y in (y0 + 1..=y0 + side).rev() {
        pts.push(Point2::new(x0, y));
    }
    pts
}

/// A grid of `n x n` patterns, each traced as six nested contours.
fn synthetic_hierarchy(n: i32) -> ContourHierarchy {
    let mut items = Vec::new();
    for gy in 0..n {
        for gx in 0..n {
            let (cx, cy) = (200 * gx + 100, 200 * gy + 100);
            let base = items.len();
            for (level, side) in [140, 136, 100, 96, 60, 56].into_iter().enumerate() {
                let parent = (level > 0).then(|| base + level - 1);
                items.push((dense_square(cx, cy, side), parent));
            }
        }
    }
    ContourHierarchy::from_parents(items).expect("synthetic hierarchy is well formed")
}

fn bench_pipeline(c: &mut Criterion) {
    let hierarchy = synthetic_hierarchy(8);
    let detector = PatternDetector::default();
    c.bench_function("detect_in_hierarchy_8x8", |b| {
        b.iter(|| detector.detect_in_hierarchy(black_box(&hierarchy)))
    });

    let outline = dense_square(500, 500, 400);
    let eps = 0.05 * perimeter(&outline);
    c.bench_function("approximate_polygon_1600pt", |b| {
        b.iter(|| approximate_polygon(black_box(&outline), eps))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
