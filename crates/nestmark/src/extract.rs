//! Reference contour extractor built on `imageproc`.
//!
//! Preprocessing is fixed: Gaussian denoise, adaptive Gaussian threshold,
//! median filter, Canny edges, then border following over the edge mask.
//! Border following yields each contour with its enclosing contour, from
//! which [`ContourHierarchy::from_parents`] derives the child and sibling
//! links.
//!
//! Border following runs on the edge mask, so every physical frame edge is
//! a thin ring with an outer and an inner border. Which nesting level ends
//! up as the detected frame therefore depends on the pattern's pixel size:
//! it is either the outer frame or the first nested frame.

use std::path::Path;

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use nalgebra::Point2;

use crate::core::{
    ContourExtractor, ContourHierarchy, ContourPoint, ExtractionError, GrayImageView,
    HierarchyError,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Sigma of a 5x5 Gaussian kernel.
const DENOISE_SIGMA: f32 = 1.1;
/// Sigma of the 13x13 Gaussian window used for the local threshold.
const THRESHOLD_SIGMA: f32 = 2.3;
/// Subtracted from the local mean before comparing.
const THRESHOLD_OFFSET: i16 = 2;
/// 9x9 median window.
const MEDIAN_RADIUS: u32 = 4;
const CANNY_LOW: f32 = 80.0;
const CANNY_HIGH: f32 = 120.0;

/// Convert an `image::GrayImage` into the lightweight core view type.
pub fn gray_view(img: &GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Load an image from disk as 8-bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage, ExtractionError> {
    let img = image::open(path).map_err(|e| ExtractionError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(img.to_luma8())
}

fn to_image(view: &GrayImageView<'_>) -> Result<GrayImage, ExtractionError> {
    view.validate()?;
    let (Ok(width), Ok(height)) = (u32::try_from(view.width), u32::try_from(view.height)) else {
        return Err(ExtractionError::Backend(format!(
            "image of {}x{} pixels is too large",
            view.width, view.height
        )));
    };
    GrayImage::from_raw(width, height, view.data.to_vec()).ok_or_else(|| {
        ExtractionError::Backend(format!(
            "buffer of {} bytes does not hold a {width}x{height} image",
            view.data.len()
        ))
    })
}

/// Denoise and binarize: pixels brighter than their local Gaussian mean
/// (minus a small offset) become white, then a median filter removes specks.
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let smooth = gaussian_blur_f32(gray, DENOISE_SIGMA);
    let local_mean = gaussian_blur_f32(&smooth, THRESHOLD_SIGMA);

    let mut binary = GrayImage::new(smooth.width(), smooth.height());
    for (x, y, px) in binary.enumerate_pixels_mut() {
        let src = i16::from(smooth.get_pixel(x, y)[0]);
        let mean = i16::from(local_mean.get_pixel(x, y)[0]);
        *px = if src > mean - THRESHOLD_OFFSET {
            Luma([255])
        } else {
            Luma([0])
        };
    }
    median_filter(&binary, MEDIAN_RADIUS, MEDIAN_RADIUS)
}

/// Canny edge mask of the binarized image.
pub fn edge_mask(gray: &GrayImage) -> GrayImage {
    canny(&binarize(gray), CANNY_LOW, CANNY_HIGH)
}

/// Build a hierarchy from border-following output.
pub fn hierarchy_from_contours(
    contours: Vec<Contour<u32>>,
) -> Result<ContourHierarchy, HierarchyError> {
    let nodes = contours
        .into_iter()
        .map(|contour| {
            let points: Vec<ContourPoint> = contour
                .points
                .iter()
                .map(|p| Point2::new(p.x as i32, p.y as i32))
                .collect();
            (points, contour.parent)
        })
        .collect();
    ContourHierarchy::from_parents(nodes)
}

/// Follow the borders of the non-zero regions of `mask`.
pub fn hierarchy_from_binary(mask: &GrayImage) -> Result<ContourHierarchy, HierarchyError> {
    hierarchy_from_contours(find_contours::<u32>(mask))
}

/// Contour extractor with the fixed preprocessing chain described above.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageprocExtractor;

impl ContourExtractor for ImageprocExtractor {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = image.width, height = image.height))
    )]
    fn extract(&self, image: &GrayImageView<'_>) -> Result<ContourHierarchy, ExtractionError> {
        if image.is_empty() {
            return Ok(ContourHierarchy::default());
        }
        let gray = to_image(image)?;
        let edges = edge_mask(&gray);
        let hierarchy =
            hierarchy_from_binary(&edges).map_err(|e| ExtractionError::Backend(e.to_string()))?;
        log::debug!("extracted {} contours", hierarchy.len());
        Ok(hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageBufferError;

    #[test]
    fn uniform_image_has_no_contours() {
        let img = GrayImage::from_pixel(64, 48, Luma([128]));
        let hierarchy = ImageprocExtractor.extract(&gray_view(&img)).unwrap();
        assert!(hierarchy.is_empty());
    }

    #[test]
    fn empty_image_is_not_an_error() {
        let view = GrayImageView {
            width: 0,
            height: 0,
            data: &[],
        };
        assert!(ImageprocExtractor.extract(&view).unwrap().is_empty());
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let data = [0u8; 10];
        let view = GrayImageView {
            width: 4,
            height: 4,
            data: &data,
        };
        assert!(matches!(
            ImageprocExtractor.extract(&view),
            Err(ExtractionError::Buffer(ImageBufferError::InvalidLength {
                expected: 16,
                got: 10
            }))
        ));
    }

    #[test]
    fn filled_square_gives_one_outer_border() {
        let mut mask = GrayImage::new(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let hierarchy = hierarchy_from_binary(&mask).unwrap();
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy.depth(0).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = load_gray(Path::new("no/such/image.png")).unwrap_err();
        assert!(matches!(err, ExtractionError::Unreadable { .. }));
    }
}
