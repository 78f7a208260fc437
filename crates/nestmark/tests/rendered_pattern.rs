#![cfg(feature = "image")]

use image::{GrayImage, Luma};
use nestmark::core::ContourExtractor;
use nestmark::extract::{gray_view, ImageprocExtractor};
use nestmark::{BoundingBox, PatternDetector};

const UNIT: u32 = 40;
const MARGIN: u32 = 2 * UNIT;

/// White page with a 7:5:3 pattern: black outer frame, white ring, black
/// core. Returns the image and the outer frame in pixels.
fn render_pattern() -> (GrayImage, BoundingBox) {
    let side = 11 * UNIT;
    let mut img = GrayImage::from_pixel(side, side, Luma([255]));
    for (units, value) in [(7, 0u8), (5, 255), (3, 0)] {
        let offset = MARGIN + (7 - units) * UNIT / 2;
        let extent = units * UNIT;
        for y in offset..offset + extent {
            for x in offset..offset + extent {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }
    let lo = f64::from(MARGIN);
    let hi = f64::from(MARGIN + 7 * UNIT);
    (img, BoundingBox::new(lo, hi, lo, hi))
}

#[test]
fn rendered_pattern_survives_preprocessing() {
    let (img, outer) = render_pattern();

    let hierarchy = ImageprocExtractor.extract(&gray_view(&img)).unwrap();
    assert!(hierarchy.len() >= 5);

    let detection = PatternDetector::default()
        .detect_in_hierarchy(&hierarchy)
        .unwrap();
    assert_eq!(detection.patterns.len(), 1);

    // The detected frame is the outer frame or the first nested one, so it
    // lies inside the outer frame and encloses the core.
    let bbox = detection.patterns[0].bbox;
    let core_lo = f64::from(MARGIN + 2 * UNIT);
    let core_hi = f64::from(MARGIN + 5 * UNIT);
    let slack = 3.0;
    assert!(bbox.xmin >= outer.xmin - slack && bbox.xmax <= outer.xmax + slack);
    assert!(bbox.ymin >= outer.ymin - slack && bbox.ymax <= outer.ymax + slack);
    assert!(bbox.xmin < core_lo && bbox.xmax > core_hi);
    assert!(bbox.ymin < core_lo && bbox.ymax > core_hi);
    assert!(((bbox.xmax - bbox.xmin) - (bbox.ymax - bbox.ymin)).abs() < 4.0);
}

#[test]
fn detector_runs_the_extractor_end_to_end() {
    let (img, _) = render_pattern();
    let detection = PatternDetector::default()
        .detect(&gray_view(&img), &ImageprocExtractor)
        .unwrap();
    assert_eq!(detection.patterns.len(), 1);
    assert_eq!(detection.boxes().len(), 1);
}
