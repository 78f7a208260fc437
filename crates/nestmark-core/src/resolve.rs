//! Removal of candidates nested inside another surviving candidate.
//!
//! The same physical pattern often passes the filter at more than one
//! nesting level. Only the outermost representative of each nested group is
//! kept.

use std::collections::HashSet;

use log::debug;

use crate::filter::Candidate;

/// Mark every candidate whose node is a strict descendant in another
/// surviving candidate's chain as dead, and return the survivors in input
/// order.
///
/// Containment is tested by node id, so the input may be any slice of
/// candidates built from the same hierarchy. Candidates that arrive already
/// dead are dropped and never shadow anyone else.
pub fn resolve_duplicates(candidates: &[Candidate]) -> Vec<Candidate> {
    let descendant_sets: Vec<HashSet<usize>> = candidates
        .iter()
        .map(|c| {
            if c.alive {
                c.chain.descendants().iter().copied().collect()
            } else {
                HashSet::new()
            }
        })
        .collect();

    let mut resolved = candidates.to_vec();
    for (i, candidate) in resolved.iter_mut().enumerate() {
        let nested = descendant_sets
            .iter()
            .enumerate()
            .any(|(j, set)| j != i && set.contains(&candidate.node));
        if nested {
            debug!("contour {} is nested in another candidate", candidate.node);
            candidate.alive = false;
        }
    }

    resolved.retain(|c| c.alive);
    resolved
}
