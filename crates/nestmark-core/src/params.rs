//! Empirical constants of the nested-square pattern and the parameter
//! structs built from them.
//!
//! Every threshold used by the selector, the geometric filter and the
//! evaluation matcher lives here. Detector code reads them through
//! [`PatternParams`] / [`MatchParams`] so tests can tweak one knob at a time.

use serde::{Deserialize, Serialize};

/// Smallest accepted first-child depth of a candidate node.
pub const MIN_NESTING_DEPTH: usize = 4;
/// Largest accepted first-child depth of a candidate node.
pub const MAX_NESTING_DEPTH: usize = 6;

/// Douglas-Peucker tolerance as a fraction of the contour perimeter.
pub const APPROX_EPSILON_FRAC: f64 = 0.05;
/// Maximum relative difference between two adjacent quad edges.
pub const SQUARENESS_TOLERANCE: f64 = 0.25;

/// Area ratio between the outer frame and the first nested frame (7² / 5²).
pub const IDEAL_RATIO_01: f64 = 49.0 / 25.0;
/// Area ratio between the first and second nested frames (5² / 3²).
pub const IDEAL_RATIO_12: f64 = 25.0 / 9.0;
/// Lower bound of the accepted ratio band, relative to the ideal ratio.
pub const RATIO_BAND_LOW: f64 = 0.5;
/// Upper bound of the accepted ratio band, relative to the ideal ratio.
pub const RATIO_BAND_HIGH: f64 = 2.0;

/// A ground-truth box counts as found when its best IoU exceeds this.
pub const IOU_THRESHOLD: f64 = 0.5;

/// Parameters of the contour-hierarchy pattern matcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    /// Inclusive lower bound on the first-child depth.
    pub min_depth: usize,
    /// Inclusive upper bound on the first-child depth.
    pub max_depth: usize,
    /// Polygon approximation tolerance, fraction of the perimeter.
    pub approx_epsilon_frac: f64,
    /// `|w - h| / min(w, h)` must stay strictly below this.
    pub squareness_tolerance: f64,
    /// Expected `area(layer0) / area(layer1)`.
    pub ideal_ratio_01: f64,
    /// Expected `area(layer1) / area(layer2)`.
    pub ideal_ratio_12: f64,
    /// Open ratio band `(low * ideal, high * ideal)`.
    pub ratio_band: [f64; 2],
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            min_depth: MIN_NESTING_DEPTH,
            max_depth: MAX_NESTING_DEPTH,
            approx_epsilon_frac: APPROX_EPSILON_FRAC,
            squareness_tolerance: SQUARENESS_TOLERANCE,
            ideal_ratio_01: IDEAL_RATIO_01,
            ideal_ratio_12: IDEAL_RATIO_12,
            ratio_band: [RATIO_BAND_LOW, RATIO_BAND_HIGH],
        }
    }
}

impl PatternParams {
    /// `true` when `depth` lies in `[min_depth, max_depth]`.
    pub fn accepts_depth(&self, depth: usize) -> bool {
        (self.min_depth..=self.max_depth).contains(&depth)
    }

    /// `true` when `ratio` lies strictly inside the band around `ideal`.
    pub fn ratio_in_band(&self, ratio: f64, ideal: f64) -> bool {
        let [low, high] = self.ratio_band;
        ratio > low * ideal && ratio < high * ideal
    }
}

/// Parameters of the detection / ground-truth matcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Minimum IoU (exclusive) for a ground-truth box to count as found.
    pub iou_threshold: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            iou_threshold: IOU_THRESHOLD,
        }
    }
}
