//! Per-image scoring of detections against ground truth.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use nestmark_core::{BoundingBox, MatchParams};
use serde::{Deserialize, Serialize};

use crate::iou::iou;

/// Confusion counts for one image or a whole run.
///
/// `true_negative` counts ground-truth boxes that no detection overlapped
/// enough. This is not a true negative in the usual sense (it is the same
/// event as a false negative); the field is kept so reports stay comparable
/// with earlier runs. Do not use it to derive specificity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
}

impl ConfusionCounts {
    /// `tp / (tp + fp)`, or `None` without any positive prediction.
    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// `tp / (tp + fn)`, or `None` without any ground truth to find.
    pub fn recall(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

impl Add for ConfusionCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            true_positive: self.true_positive + rhs.true_positive,
            true_negative: self.true_negative + rhs.true_negative,
            false_positive: self.false_positive + rhs.false_positive,
            false_negative: self.false_negative + rhs.false_negative,
        }
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ConfusionCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Best IoU over all detections, for each ground-truth box.
pub fn best_ious(detected: &[BoundingBox], truth: &[BoundingBox]) -> Vec<f64> {
    truth
        .iter()
        .map(|gt| detected.iter().map(|d| iou(d, gt)).fold(0.0, f64::max))
        .collect()
}

/// Score one image.
///
/// Every ground-truth box whose best IoU exceeds the threshold is a true
/// positive; every other one adds to `true_negative`. Detections are not
/// consumed, so one detection may satisfy several overlapping truths; the
/// derived `false_positive` saturates at zero in that case.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip_all,
        fields(detected = detected.len(), truth = truth.len())
    )
)]
pub fn match_detections(
    detected: &[BoundingBox],
    truth: &[BoundingBox],
    params: &MatchParams,
) -> ConfusionCounts {
    let (hits, misses) = best_ious(detected, truth)
        .into_iter()
        .fold((0u64, 0u64), |(hit, miss), best| {
            if best > params.iou_threshold {
                (hit + 1, miss)
            } else {
                (hit, miss + 1)
            }
        });

    ConfusionCounts {
        true_positive: hits,
        true_negative: misses,
        false_positive: (detected.len() as u64).saturating_sub(hits),
        false_negative: (truth.len() as u64).saturating_sub(hits),
    }
}
