//! Draw detected outlines onto a copy of the input image.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::core::PatternDetection;

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Stroke half-width in pixels.
const OUTLINE_HALF_WIDTH: i32 = 1;

/// Trace the outline of every detected pattern in green.
pub fn draw_patterns(canvas: &mut RgbImage, detection: &PatternDetection) {
    for pattern in &detection.patterns {
        let outline = &pattern.outline;
        if outline.len() < 2 {
            continue;
        }
        for (i, a) in outline.iter().enumerate() {
            let b = &outline[(i + 1) % outline.len()];
            for d in -OUTLINE_HALF_WIDTH..=OUTLINE_HALF_WIDTH {
                let d = d as f32;
                draw_line_segment_mut(
                    canvas,
                    (a.x as f32 + d, a.y as f32),
                    (b.x as f32 + d, b.y as f32),
                    OUTLINE_COLOR,
                );
                draw_line_segment_mut(
                    canvas,
                    (a.x as f32, a.y as f32 + d),
                    (b.x as f32, b.y as f32 + d),
                    OUTLINE_COLOR,
                );
            }
        }
    }
}

/// Read `input`, draw the detections and save the result to `output`.
pub fn write_annotated(
    input: &Path,
    detection: &PatternDetection,
    output: &Path,
) -> Result<(), image::ImageError> {
    let mut canvas = image::open(input)?.to_rgb8();
    draw_patterns(&mut canvas, detection);
    canvas.save(output)
}
