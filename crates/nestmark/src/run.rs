//! Batch runs over labeled corpora and plain image directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::annotate::write_annotated;
use crate::core::{ContourExtractor, DetectError, MatchParams, PatternDetection, PatternDetector};
use crate::eval::{
    match_detections, DetectionReport, EvalConfig, EvalIoError, EvaluationReport, ImageRecord,
    LabelError, LabelTable, MetricsAggregator,
};
use crate::extract::{gray_view, load_gray};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors that abort a whole run. Per-image failures are recorded instead.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Report(#[from] EvalIoError),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Optional outputs of a run.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Write a copy of every image with its detections drawn here.
    pub annotate_dir: Option<PathBuf>,
}

fn timed_result<T, E, F: FnOnce() -> Result<T, E>>(f: F) -> Result<(T, Duration), E> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed()))
}

/// Load `path` and run the detector on it.
pub fn detect_file<E: ContourExtractor + ?Sized>(
    path: &Path,
    detector: &PatternDetector,
    extractor: &E,
) -> Result<PatternDetection, DetectError> {
    let gray = load_gray(path)?;
    detector.detect(&gray_view(&gray), extractor)
}

fn prepare_annotate_dir(options: &RunOptions) -> Result<(), RunError> {
    if let Some(dir) = &options.annotate_dir {
        fs::create_dir_all(dir).map_err(|source| RunError::Io {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(())
}

fn annotate(options: &RunOptions, image: &Path, detection: &PatternDetection) {
    let (Some(dir), Some(name)) = (&options.annotate_dir, image.file_name()) else {
        return;
    };
    let out = dir.join(name);
    if let Err(e) = write_annotated(image, detection, &out) {
        warn!("could not write {}: {e}", out.display());
    }
}

/// Detect, time and record a single image.
fn process_image<E: ContourExtractor + ?Sized>(
    image: &Path,
    detector: &PatternDetector,
    extractor: &E,
    options: &RunOptions,
) -> (ImageRecord, Option<Duration>) {
    let mut record = ImageRecord::new(image);
    match timed_result(|| detect_file(image, detector, extractor)) {
        Ok((detection, elapsed)) => {
            info!(
                "{}: {} pattern(s) in {:.1} ms",
                image.display(),
                detection.patterns.len(),
                elapsed.as_secs_f64() * 1e3
            );
            annotate(options, image, &detection);
            record.detections = detection.boxes();
            record.elapsed_ms = Some(elapsed.as_secs_f64() * 1e3);
            (record, Some(elapsed))
        }
        Err(e) => {
            warn!("{}: {e}", image.display());
            record.error = Some(e.to_string());
            (record, None)
        }
    }
}

/// Score every image of `labels` in path order.
///
/// An image that cannot be processed contributes no detections; its ground
/// truth still counts as missed and its time is left out of the mean.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(images = labels.len()))
)]
pub fn evaluate_labeled<E: ContourExtractor + ?Sized>(
    labels: &LabelTable,
    detector: &PatternDetector,
    extractor: &E,
    matching: &MatchParams,
    options: &RunOptions,
) -> Result<EvaluationReport, RunError> {
    prepare_annotate_dir(options)?;

    let mut aggregator = MetricsAggregator::new();
    let mut images = Vec::with_capacity(labels.len());
    for (image, truth) in labels.iter() {
        let (mut record, elapsed) = process_image(image, detector, extractor, options);
        let counts = match_detections(&record.detections, truth, matching);
        aggregator.record(counts, elapsed);
        record.num_truth = Some(truth.len());
        record.counts = Some(counts);
        images.push(record);
    }

    let metrics = aggregator.finish();
    info!(
        "evaluated {} images: tp={} fp={} fn={}",
        metrics.images,
        metrics.counts.true_positive,
        metrics.counts.false_positive,
        metrics.counts.false_negative
    );
    Ok(EvaluationReport { metrics, images })
}

/// Labeled run driven by a config file; the report is written to the
/// config's output path.
pub fn run_evaluation<E: ContourExtractor + ?Sized>(
    config: &EvalConfig,
    extractor: &E,
    options: &RunOptions,
) -> Result<EvaluationReport, RunError> {
    let labels = config.build_labels()?;
    info!(
        "loaded {} labeled images with {} boxes",
        labels.len(),
        labels.num_boxes()
    );
    let detector = PatternDetector::new(config.pattern_params());
    let report = evaluate_labeled(
        &labels,
        &detector,
        extractor,
        &config.match_params(),
        options,
    )?;
    report.write_json(config.output_path())?;
    Ok(report)
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, RunError> {
    let io_err = |source| RunError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Detect on every image in `dir` without ground truth.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(dir = %dir.display()))
)]
pub fn run_directory<E: ContourExtractor + ?Sized>(
    dir: &Path,
    detector: &PatternDetector,
    extractor: &E,
    options: &RunOptions,
) -> Result<DetectionReport, RunError> {
    prepare_annotate_dir(options)?;
    let images = list_images(dir)?
        .iter()
        .map(|image| process_image(image, detector, extractor, options).0)
        .collect();
    let report = DetectionReport { images };
    info!(
        "{} images, {} detections",
        report.images.len(),
        report.num_detections()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContourHierarchy, ExtractionError, GrayImageView};
    use image::{GrayImage, Luma};

    struct NoContours;

    impl ContourExtractor for NoContours {
        fn extract(&self, _: &GrayImageView<'_>) -> Result<ContourHierarchy, ExtractionError> {
            Ok(ContourHierarchy::from_parents(Vec::new()).unwrap())
        }
    }

    #[test]
    fn unreadable_image_counts_its_truth_as_missed() {
        let mut labels = LabelTable::new();
        labels.insert(
            "does/not/exist.png",
            crate::core::BoundingBox::new(0.0, 10.0, 0.0, 10.0),
        );
        let report = evaluate_labeled(
            &labels,
            &PatternDetector::default(),
            &NoContours,
            &MatchParams::default(),
            &RunOptions::default(),
        )
        .unwrap();

        assert_eq!(report.metrics.images, 1);
        assert_eq!(report.metrics.counts.false_negative, 1);
        assert_eq!(report.metrics.counts.true_negative, 1);
        assert_eq!(report.metrics.precision, None);
        assert_eq!(report.metrics.mean_latency_ms, None);
        assert!(report.images[0].error.is_some());
    }

    #[test]
    fn directory_listing_skips_non_images() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::from_pixel(8, 8, Luma([0]))
            .save(dir.path().join("b.png"))
            .unwrap();
        GrayImage::from_pixel(8, 8, Luma([0]))
            .save(dir.path().join("a.png"))
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let images = list_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, ["a.png", "b.png"]);

        let report = run_directory(
            dir.path(),
            &PatternDetector::default(),
            &NoContours,
            &RunOptions::default(),
        )
        .unwrap();
        assert_eq!(report.images.len(), 2);
        assert!(report.images.iter().all(|r| r.error.is_none()));
        assert!(report.images.iter().all(|r| r.elapsed_ms.is_some()));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = list_images(Path::new("no/such/dir")).unwrap_err();
        assert!(matches!(err, RunError::Io { .. }));
    }
}
