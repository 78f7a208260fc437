use nestmark_core::BoundingBox;

/// Intersection over union of two boxes.
///
/// Returns 0 when the union is not positive (degenerate or inverted boxes),
/// so callers never see NaN or infinities.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let overlap = a.overlap_area(b);
    let union = a.area() + b.area() - overlap;
    if union > 0.0 {
        overlap / union
    } else {
        0.0
    }
}
