//! Contour-hierarchy matcher for nested-square fiducial patterns.
//!
//! The pattern is an outer square frame holding two nested frames whose
//! side lengths relate as 7:5:3. Given a contour hierarchy of an image, the
//! detector runs three stages:
//!
//! 1. [`select_by_depth`] keeps nodes whose first-child chain is 4 to 6
//!    hops deep.
//! 2. [`filter_candidates`] keeps near-square quadrilaterals whose nested
//!    layers have the expected area ratios.
//! 3. [`resolve_duplicates`] drops candidates nested inside another one.
//!
//! This crate does not touch pixels. Contours come from a
//! [`ContourExtractor`] implementation supplied by the caller.
//!
//! ```
//! use nalgebra::Point2;
//! use nestmark_core::{ContourHierarchy, PatternDetector};
//!
//! let square = |side: i32| {
//!     let h = side / 2;
//!     vec![
//!         Point2::new(100 - h, 100 - h),
//!         Point2::new(100 + h, 100 - h),
//!         Point2::new(100 + h, 100 + h),
//!         Point2::new(100 - h, 100 + h),
//!     ]
//! };
//! let hierarchy = ContourHierarchy::from_parents(vec![
//!     (square(140), None),
//!     (square(100), Some(0)),
//!     (square(60), Some(1)),
//!     (square(20), Some(2)),
//!     (square(10), Some(3)),
//! ])?;
//!
//! let detection = PatternDetector::default().detect_in_hierarchy(&hierarchy)?;
//! assert_eq!(detection.patterns.len(), 1);
//! # Ok::<(), nestmark_core::HierarchyError>(())
//! ```

mod detector;
mod extract;
mod filter;
mod geometry;
mod hierarchy;
mod image;
mod logger;
pub mod params;
mod resolve;
mod select;

pub use detector::{DetectError, DetectedPattern, PatternDetection, PatternDetector};
pub use extract::{ContourExtractor, ExtractionError};
pub use filter::{check_shape, filter_candidates, measure_candidate, Candidate, Rejection, ShapeScore};
pub use geometry::{approximate_polygon, distance, perimeter, polygon_area, BoundingBox};
pub use hierarchy::{
    Chain, ContourHierarchy, ContourNode, ContourPoint, EmptyChain, HierarchyError, NodeLinks,
};
pub use image::{GrayImageView, ImageBufferError};
pub use params::{MatchParams, PatternParams};
pub use resolve::resolve_duplicates;
pub use select::select_by_depth;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity, LoggerError};
