use log::info;
use serde::{Deserialize, Serialize};

use crate::extract::{ContourExtractor, ExtractionError};
use crate::filter::{filter_candidates, Candidate};
use crate::geometry::BoundingBox;
use crate::hierarchy::{ContourHierarchy, ContourPoint, HierarchyError};
use crate::image::GrayImageView;
use crate::params::PatternParams;
use crate::resolve::resolve_duplicates;
use crate::select::select_by_depth;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the pattern detector.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("malformed contour hierarchy: {0}")]
    MalformedHierarchy(#[from] HierarchyError),
}

/// One located pattern: the surviving candidate and its outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub candidate: Candidate,
    /// Raw contour of the candidate node.
    pub outline: Vec<ContourPoint>,
    /// Axis-aligned bounds of `outline`.
    pub bbox: BoundingBox,
}

/// Output of one detector run over a hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternDetection {
    /// Number of contours in the analysed hierarchy.
    pub num_contours: usize,
    /// Nodes that passed the depth selector.
    pub depth_candidates: Vec<usize>,
    /// Number of candidates that passed the geometric filter.
    pub num_filtered: usize,
    pub patterns: Vec<DetectedPattern>,
}

impl PatternDetection {
    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.patterns.iter().map(|p| p.bbox).collect()
    }
}

/// Nested-square pattern detector: selector, filter and resolver in a row.
#[derive(Clone, Debug, Default)]
pub struct PatternDetector {
    params: PatternParams,
}

impl PatternDetector {
    pub fn new(params: PatternParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PatternParams {
        &self.params
    }

    /// Run the matcher on an already extracted hierarchy.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(contours = hierarchy.len()))
    )]
    pub fn detect_in_hierarchy(
        &self,
        hierarchy: &ContourHierarchy,
    ) -> Result<PatternDetection, HierarchyError> {
        let depth_candidates = select_by_depth(hierarchy, &self.params)?;
        let filtered = filter_candidates(hierarchy, &depth_candidates, &self.params)?;
        let num_filtered = filtered.len();

        let patterns: Vec<DetectedPattern> = resolve_duplicates(&filtered)
            .into_iter()
            .filter_map(|candidate| {
                let outline = hierarchy.points(candidate.node).to_vec();
                let bbox = BoundingBox::from_points(&outline)?;
                Some(DetectedPattern {
                    candidate,
                    outline,
                    bbox,
                })
            })
            .collect();

        info!(
            "contours={} depth_candidates={} filtered={} patterns={}",
            hierarchy.len(),
            depth_candidates.len(),
            num_filtered,
            patterns.len()
        );

        Ok(PatternDetection {
            num_contours: hierarchy.len(),
            depth_candidates,
            num_filtered,
            patterns,
        })
    }

    /// Extract contours from `image` with `extractor`, then run the matcher.
    pub fn detect<E: ContourExtractor + ?Sized>(
        &self,
        image: &GrayImageView<'_>,
        extractor: &E,
    ) -> Result<PatternDetection, DetectError> {
        let hierarchy = extractor.extract(image)?;
        Ok(self.detect_in_hierarchy(&hierarchy)?)
    }
}
