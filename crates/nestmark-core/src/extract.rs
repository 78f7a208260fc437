//! Contract of the contour extractor collaborator.

use crate::hierarchy::ContourHierarchy;
use crate::image::{GrayImageView, ImageBufferError};

/// The extractor could not produce a hierarchy for an image.
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("failed to read image {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error(transparent)]
    Buffer(#[from] ImageBufferError),
    #[error("contour extraction failed: {0}")]
    Backend(String),
}

/// Turns a grayscale bitmap into a contour hierarchy.
///
/// Implementations own all preprocessing (denoising, binarization, edge
/// extraction). The returned hierarchy must use integer pixel coordinates.
pub trait ContourExtractor {
    fn extract(&self, image: &GrayImageView<'_>) -> Result<ContourHierarchy, ExtractionError>;
}

