//! Geometric verification of depth-selected candidates.
//!
//! A candidate survives when its simplified outline is a near-square
//! quadrilateral and at least one of the two nesting levels below it has the
//! expected area ratio.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{approximate_polygon, distance, perimeter, polygon_area};
use crate::hierarchy::{Chain, ContourHierarchy, HierarchyError};
use crate::params::PatternParams;

/// Measurements taken on one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeScore {
    /// Vertex count of the simplified outline.
    pub vertices: usize,
    /// `|w - h| / min(w, h)` of the simplified quad; `None` when the outline
    /// is not a quad or has a zero-length edge.
    pub squareness: Option<f64>,
    /// `area(layer0) / area(layer1)`; `None` when `layer1` is missing or empty.
    pub ratio_01: Option<f64>,
    /// `area(layer1) / area(layer2)`; `None` when either layer is missing or
    /// `layer2` is empty.
    pub ratio_12: Option<f64>,
}

/// Why the filter dropped a candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    NotQuadrilateral { vertices: usize },
    NotSquare { squareness: Option<f64> },
    RatioMismatch {
        ratio_01: Option<f64>,
        ratio_12: Option<f64>,
    },
}

/// A contour tentatively identified as the outer frame of the pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub node: usize,
    /// First-child chain starting at `node`.
    pub chain: Chain,
    /// Cleared by the duplicate resolver for nested repeats.
    pub alive: bool,
    pub shape: ShapeScore,
}

fn guarded_ratio(num: f64, den: f64) -> Option<f64> {
    (den > 0.0).then(|| num / den)
}

fn layer_area(hierarchy: &ContourHierarchy, chain: &Chain, level: usize) -> Option<f64> {
    chain
        .layer(level)
        .map(|id| polygon_area(hierarchy.points(id)))
}

/// Measure the candidate rooted at `node`.
pub fn measure_candidate(
    hierarchy: &ContourHierarchy,
    node: usize,
    params: &PatternParams,
) -> Result<(Chain, ShapeScore), HierarchyError> {
    let chain = hierarchy.chain(node)?;
    let outline = hierarchy.points(node);

    let approx = approximate_polygon(outline, params.approx_epsilon_frac * perimeter(outline));
    let squareness = if approx.len() == 4 {
        let w = distance(&approx[0], &approx[1]);
        let h = distance(&approx[1], &approx[2]);
        guarded_ratio((w - h).abs(), w.min(h))
    } else {
        None
    };

    let area0 = layer_area(hierarchy, &chain, 0);
    let area1 = layer_area(hierarchy, &chain, 1);
    let area2 = layer_area(hierarchy, &chain, 2);
    let ratio_01 = area0.zip(area1).and_then(|(a0, a1)| guarded_ratio(a0, a1));
    let ratio_12 = area1.zip(area2).and_then(|(a1, a2)| guarded_ratio(a1, a2));

    let shape = ShapeScore {
        vertices: approx.len(),
        squareness,
        ratio_01,
        ratio_12,
    };
    Ok((chain, shape))
}

/// Apply the quad, squareness and area-ratio tests to a measured shape.
pub fn check_shape(shape: &ShapeScore, params: &PatternParams) -> Result<(), Rejection> {
    if shape.vertices != 4 {
        return Err(Rejection::NotQuadrilateral {
            vertices: shape.vertices,
        });
    }
    if !shape
        .squareness
        .is_some_and(|s| s < params.squareness_tolerance)
    {
        return Err(Rejection::NotSquare {
            squareness: shape.squareness,
        });
    }

    let ok_01 = shape
        .ratio_01
        .is_some_and(|r| params.ratio_in_band(r, params.ideal_ratio_01));
    let ok_12 = shape
        .ratio_12
        .is_some_and(|r| params.ratio_in_band(r, params.ideal_ratio_12));
    if ok_01 || ok_12 {
        Ok(())
    } else {
        Err(Rejection::RatioMismatch {
            ratio_01: shape.ratio_01,
            ratio_12: shape.ratio_12,
        })
    }
}

/// Keep the geometrically plausible candidates, in input order.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(candidates = candidates.len()))
)]
pub fn filter_candidates(
    hierarchy: &ContourHierarchy,
    candidates: &[usize],
    params: &PatternParams,
) -> Result<Vec<Candidate>, HierarchyError> {
    let mut out = Vec::new();
    for &node in candidates {
        let (chain, shape) = measure_candidate(hierarchy, node, params)?;
        match check_shape(&shape, params) {
            Ok(()) => out.push(Candidate {
                node,
                chain,
                alive: true,
                shape,
            }),
            Err(reason) => debug!("contour {node} rejected: {reason:?}"),
        }
    }
    Ok(out)
}
