//! High-level facade for the `nestmark-*` workspace.
//!
//! This crate provides:
//! - re-exports of the contour matcher ([`core`]) and the evaluation harness
//!   ([`eval`])
//! - (feature `image`) a reference contour extractor built on `imageproc`,
//!   outline drawing and batch runs over labeled corpora or directories
//! - (feature `cli`) the `nestmark` binary
//!
//! ## Quickstart
//!
//! ```no_run
//! use nestmark::extract::ImageprocExtractor;
//! use nestmark::run::detect_file;
//! use nestmark::PatternDetector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detection = detect_file(
//!     "frame.png".as_ref(),
//!     &PatternDetector::default(),
//!     &ImageprocExtractor,
//! )?;
//! for bbox in detection.boxes() {
//!     println!("{bbox:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub use nestmark_core as core;
pub use nestmark_eval as eval;

pub use nestmark_core::{BoundingBox, MatchParams, PatternDetection, PatternDetector, PatternParams};
pub use nestmark_eval::{ConfusionCounts, EvalConfig, EvaluationReport, RunMetrics};

#[cfg(feature = "image")]
pub mod annotate;
#[cfg(feature = "image")]
pub mod extract;
#[cfg(feature = "image")]
pub mod run;
