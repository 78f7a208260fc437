//! Scoring of nested-square detections against labeled boxes.
//!
//! Per image, [`match_detections`] turns detections and ground truth into
//! [`ConfusionCounts`]; a [`MetricsAggregator`] sums them over a run and
//! reports precision, recall and mean latency. [`LabelTable`] holds the
//! ground truth, usually imported from a labeling-tool CSV export.
//!
//! ```
//! use nestmark_core::{BoundingBox, MatchParams};
//! use nestmark_eval::{match_detections, MetricsAggregator};
//!
//! let truth = [BoundingBox::new(0.0, 10.0, 0.0, 10.0)];
//! let detected = [BoundingBox::new(1.0, 10.0, 0.0, 10.0)];
//!
//! let mut agg = MetricsAggregator::new();
//! agg.record(match_detections(&detected, &truth, &MatchParams::default()), None);
//! assert_eq!(agg.finish().recall, Some(1.0));
//! ```

mod iou;
mod labels;
mod matcher;
mod metrics;
mod report;

pub use iou::iou;
pub use labels::{ImageNaming, LabelError, LabelTable, PercentRect};
pub use matcher::{best_ious, match_detections, ConfusionCounts};
pub use metrics::{MetricsAggregator, RunMetrics};
pub use report::{
    DetectionReport, EvalConfig, EvalIoError, EvaluationReport, ImageRecord, LabelSetConfig,
};
