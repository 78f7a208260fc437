//! JSON configuration and report helpers for evaluation runs.

use std::fs;
use std::path::{Path, PathBuf};

use nestmark_core::{BoundingBox, MatchParams, PatternParams};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::labels::{ImageNaming, LabelError, LabelTable};
use crate::matcher::ConfusionCounts;
use crate::metrics::RunMetrics;

#[derive(thiserror::Error, Debug)]
pub enum EvalIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EvalIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), EvalIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// One exported label file and the directory holding its images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSetConfig {
    pub labels_csv: PathBuf,
    pub image_dir: PathBuf,
    #[serde(default)]
    pub naming: ImageNaming,
}

/// Configuration of a labeled evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    pub label_sets: Vec<LabelSetConfig>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub pattern: Option<PatternParams>,
    #[serde(default)]
    pub matching: Option<MatchParams>,
}

impl EvalConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, EvalIoError> {
        read_json(path.as_ref())
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalIoError> {
        write_json(self, path.as_ref())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("nestmark_eval_report.json"))
    }

    pub fn pattern_params(&self) -> PatternParams {
        self.pattern.clone().unwrap_or_default()
    }

    pub fn match_params(&self) -> MatchParams {
        self.matching.clone().unwrap_or_default()
    }

    /// Import every label set into one table.
    pub fn build_labels(&self) -> Result<LabelTable, LabelError> {
        let mut table = LabelTable::new();
        for set in &self.label_sets {
            table.import_csv_file(&set.labels_csv, &set.image_dir, set.naming)?;
        }
        Ok(table)
    }
}

/// Outcome for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image: PathBuf,
    /// Bounding boxes of the surviving patterns.
    #[serde(default)]
    pub detections: Vec<BoundingBox>,
    /// Wall time of extraction and detection; absent when it failed.
    #[serde(default)]
    pub elapsed_ms: Option<f64>,
    /// Only set on labeled runs.
    #[serde(default)]
    pub num_truth: Option<usize>,
    #[serde(default)]
    pub counts: Option<ConfusionCounts>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ImageRecord {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            detections: Vec::new(),
            elapsed_ms: None,
            num_truth: None,
            counts: None,
            error: None,
        }
    }
}

/// Report of a labeled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metrics: RunMetrics,
    pub images: Vec<ImageRecord>,
}

impl EvaluationReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, EvalIoError> {
        read_json(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalIoError> {
        write_json(self, path.as_ref())
    }
}

/// Report of an unlabeled run over a directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub images: Vec<ImageRecord>,
}

impl DetectionReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, EvalIoError> {
        read_json(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalIoError> {
        write_json(self, path.as_ref())
    }

    pub fn num_detections(&self) -> usize {
        self.images.iter().map(|r| r.detections.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: EvalConfig = serde_json::from_str(
            r#"{ "label_sets": [ { "labels_csv": "set1.csv", "image_dir": "images/set1" } ] }"#,
        )
        .unwrap();
        assert_eq!(cfg.label_sets[0].naming, ImageNaming::StripUploadPrefix);
        assert_eq!(cfg.output_path(), PathBuf::from("nestmark_eval_report.json"));
        assert_eq!(cfg.pattern_params(), PatternParams::default());
        assert_eq!(cfg.match_params(), MatchParams::default());
    }

    #[test]
    fn params_overrides_are_partial() {
        let cfg: EvalConfig = serde_json::from_str(
            r#"{
                "label_sets": [],
                "output_path": "out.json",
                "pattern": { "min_depth": 3 },
                "matching": { "iou_threshold": 0.3 }
            }"#,
        )
        .unwrap();
        let pattern = cfg.pattern_params();
        assert_eq!(pattern.min_depth, 3);
        assert_eq!(pattern.max_depth, PatternParams::default().max_depth);
        assert_eq!(cfg.match_params().iou_threshold, 0.3);
        assert_eq!(cfg.output_path(), PathBuf::from("out.json"));
    }

    #[test]
    fn naming_parses_snake_case() {
        let set: LabelSetConfig = serde_json::from_str(
            r#"{ "labels_csv": "a.csv", "image_dir": "a", "naming": "verbatim" }"#,
        )
        .unwrap();
        assert_eq!(set.naming, ImageNaming::Verbatim);
    }
}
