use std::fs;
use std::path::Path;
use std::time::Duration;

use approx::assert_relative_eq;
use nestmark_core::BoundingBox;
use nestmark_eval::{
    match_detections, EvalConfig, EvaluationReport, ImageRecord, LabelSetConfig,
    MetricsAggregator,
};

const SET1: &str = r#"image,label
0a1b2c3d-left.png,"[{""x"": 0, ""y"": 0, ""width"": 10, ""height"": 10, ""original_width"": 100, ""original_height"": 100}, {""x"": 20, ""y"": 20, ""width"": 10, ""height"": 10, ""original_width"": 100, ""original_height"": 100}]"
"#;

const SET2: &str = r#"image,label
4e5f6a7b-right.png,"[{""x"": 50, ""y"": 50, ""width"": 25, ""height"": 25, ""original_width"": 400, ""original_height"": 200}]"
"#;

#[test]
fn config_driven_labels_score_and_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("set1.csv"), SET1).unwrap();
    fs::write(root.join("set2.csv"), SET2).unwrap();

    let cfg = EvalConfig {
        label_sets: vec![
            LabelSetConfig {
                labels_csv: root.join("set1.csv"),
                image_dir: root.join("TestSet1"),
                naming: Default::default(),
            },
            LabelSetConfig {
                labels_csv: root.join("set2.csv"),
                image_dir: root.join("TestSet2"),
                naming: Default::default(),
            },
        ],
        output_path: Some(root.join("report.json").display().to_string()),
        pattern: None,
        matching: None,
    };
    let cfg_path = root.join("eval.json");
    cfg.write_json(&cfg_path).unwrap();
    let cfg = EvalConfig::load_json(&cfg_path).unwrap();

    let labels = cfg.build_labels().unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.num_boxes(), 3);

    let right = labels.boxes(&root.join("TestSet2/right.png"));
    assert_eq!(right, &[BoundingBox::new(200.0, 300.0, 100.0, 150.0)]);

    // One detection per image: a hit on the first left box, a miss on the right.
    let detections = [
        vec![BoundingBox::new(1.0, 9.0, 1.0, 9.0)],
        vec![BoundingBox::new(0.0, 20.0, 0.0, 20.0)],
    ];
    let mut agg = MetricsAggregator::new();
    let mut images = Vec::new();
    for ((path, truth), detected) in labels.iter().zip(detections) {
        let counts = match_detections(&detected, truth, &cfg.match_params());
        agg.record(counts, Some(Duration::from_millis(5)));
        let mut record = ImageRecord::new(path);
        record.num_truth = Some(truth.len());
        record.counts = Some(counts);
        record.elapsed_ms = Some(5.0);
        record.detections = detected;
        images.push(record);
    }

    let report = EvaluationReport {
        metrics: agg.finish(),
        images,
    };
    assert_eq!(report.metrics.counts.true_positive, 1);
    assert_eq!(report.metrics.counts.false_positive, 1);
    assert_eq!(report.metrics.counts.false_negative, 2);
    assert_relative_eq!(report.metrics.precision.unwrap(), 0.5);
    assert_relative_eq!(report.metrics.recall.unwrap(), 1.0 / 3.0);
    assert_relative_eq!(report.metrics.mean_latency_ms.unwrap(), 5.0, epsilon = 1e-9);

    let out = cfg.output_path();
    report.write_json(&out).unwrap();
    let loaded = EvaluationReport::load_json(&out).unwrap();
    assert!(Path::new(&out).exists());
    assert_eq!(loaded.images.len(), 2);
    assert_eq!(loaded.metrics.counts, report.metrics.counts);
    assert_eq!(loaded.images[1].counts, report.images[1].counts);
    assert_eq!(loaded.images[0].image, report.images[0].image);
    assert_relative_eq!(loaded.metrics.recall.unwrap(), 1.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn missing_label_file_is_an_io_error() {
    let cfg = EvalConfig {
        label_sets: vec![LabelSetConfig {
            labels_csv: "definitely/not/here.csv".into(),
            image_dir: "images".into(),
            naming: Default::default(),
        }],
        output_path: None,
        pattern: None,
        matching: None,
    };
    let err = cfg.build_labels().unwrap_err();
    assert!(matches!(err, nestmark_eval::LabelError::Io(_)));
}
