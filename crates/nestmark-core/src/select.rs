//! Depth-based candidate selection.

use log::debug;

use crate::hierarchy::{ContourHierarchy, HierarchyError};
use crate::params::PatternParams;

/// Ids of all nodes whose first-child depth lies in the accepted band.
///
/// Nodes are visited in index order, so the result is sorted. A cycle in
/// the first-child links aborts the scan with [`HierarchyError::Cycle`].
pub fn select_by_depth(
    hierarchy: &ContourHierarchy,
    params: &PatternParams,
) -> Result<Vec<usize>, HierarchyError> {
    let mut selected = Vec::new();
    for node in hierarchy.nodes() {
        let depth = hierarchy.depth(node.id)?;
        if params.accepts_depth(depth) {
            selected.push(node.id);
        }
    }
    debug!(
        "depth selection kept {} of {} contours",
        selected.len(),
        hierarchy.len()
    );
    Ok(selected)
}
