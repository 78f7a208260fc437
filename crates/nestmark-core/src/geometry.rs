//! Polygon measurements used by the geometric filter and the evaluator.
//!
//! All functions treat their input as a closed polygon: the last point
//! connects back to the first.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::hierarchy::ContourPoint;

fn to_f64(p: &ContourPoint) -> Point2<f64> {
    Point2::new(f64::from(p.x), f64::from(p.y))
}

/// Euclidean distance between two contour points.
pub fn distance(a: &ContourPoint, b: &ContourPoint) -> f64 {
    (to_f64(a) - to_f64(b)).norm()
}

/// Length of the closed polyline through `points`.
pub fn perimeter(points: &[ContourPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| distance(a, b))
        .sum()
}

/// Unsigned area enclosed by the polygon (shoelace formula).
pub fn polygon_area(points: &[ContourPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 * 0.5
}

/// Distance from `p` to the infinite line through `a` and `b`
/// (distance to `a` when the two coincide).
fn line_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let ab: Vector2<f64> = b - a;
    let ap: Vector2<f64> = p - a;
    let len = ab.norm();
    if len <= f64::EPSILON {
        return ap.norm();
    }
    (ab.x * ap.y - ab.y * ap.x).abs() / len
}

/// Douglas-Peucker over the open run `points[first..=last]`, marking kept
/// indices in `keep`.
fn simplify_run(points: &[Point2<f64>], first: usize, last: usize, eps: f64, keep: &mut [bool]) {
    let mut stack = vec![(first, last)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (a, b) = (points[start], points[end]);
        let (split, dist) = ((start + 1)..end)
            .map(|i| (i, line_distance(points[i], a, b)))
            .fold((start, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if dist > eps {
            keep[split] = true;
            stack.push((start, split));
            stack.push((split, end));
        }
    }
}

fn farthest_from(points: &[Point2<f64>], from: usize) -> usize {
    let origin = points[from];
    points
        .iter()
        .enumerate()
        .fold((from, 0.0), |best, (i, p)| {
            let d = (p - origin).norm_squared();
            if d > best.1 {
                (i, d)
            } else {
                best
            }
        })
        .0
}

/// Simplify a closed polygon with the Douglas-Peucker rule.
///
/// The ring is split at two mutually distant points, each half is
/// simplified on its own, and a final sweep drops vertices that sit within
/// `epsilon` of the line through their neighbours.
pub fn approximate_polygon(points: &[ContourPoint], epsilon: f64) -> Vec<ContourPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let n = points.len();
    let pts: Vec<Point2<f64>> = points.iter().map(to_f64).collect();

    let a = farthest_from(&pts, 0);
    let b = farthest_from(&pts, a);
    if a == b {
        return vec![points[a]];
    }

    // Rotate so the ring starts at `a`, then append `a` again to close it.
    let ring: Vec<Point2<f64>> = (0..=n).map(|k| pts[(a + k) % n]).collect();
    let mid = (b + n - a) % n;

    let mut keep = vec![false; n + 1];
    keep[0] = true;
    keep[mid] = true;
    simplify_run(&ring, 0, mid, epsilon, &mut keep);
    simplify_run(&ring, mid, n, epsilon, &mut keep);

    let mut kept: Vec<usize> = (0..n).filter(|&k| keep[k]).collect();

    loop {
        if kept.len() <= 3 {
            break;
        }
        let m = kept.len();
        let redundant = (0..m).find(|&i| {
            let prev = ring[kept[(i + m - 1) % m]];
            let next = ring[kept[(i + 1) % m]];
            line_distance(ring[kept[i]], prev, next) <= epsilon
        });
        match redundant {
            Some(i) => {
                kept.remove(i);
            }
            None => break,
        }
    }

    kept.into_iter().map(|k| points[(a + k) % n]).collect()
}

/// Axis-aligned rectangle `[xmin, xmax] x [ymin, ymax]` in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Tight box around `points`; `None` for an empty slice.
    pub fn from_points(points: &[ContourPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = (first.x, first.x, first.y, first.y);
        let (xmin, xmax, ymin, ymax) = points.iter().fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y))
        });
        Some(Self::new(
            f64::from(xmin),
            f64::from(xmax),
            f64::from(ymin),
            f64::from(ymax),
        ))
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Signed area `width * height`; inverted boxes give a negative value.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Area of the intersection rectangle, zero when the boxes are apart on
    /// either axis.
    pub fn overlap_area(&self, other: &Self) -> f64 {
        let w = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let h = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        w * h
    }
}
