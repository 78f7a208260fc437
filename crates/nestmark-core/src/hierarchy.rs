//! Contour hierarchy: an arena of closed polylines linked by index.
//!
//! Nodes are produced once per image by a [`crate::ContourExtractor`] and
//! never mutated afterwards. Relations (`next`, `prev`, `first_child`,
//! `parent`) are indices into the same arena, mirroring the flat
//! `[next, prev, first_child, parent]` table that border-following
//! extractors emit.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate of a contour point.
pub type ContourPoint = Point2<i32>;

/// Errors raised while building or walking a hierarchy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("node {node}: {relation} link points at {target}, but the hierarchy has {len} nodes")]
    DanglingLink {
        node: usize,
        relation: &'static str,
        target: usize,
        len: usize,
    },
    #[error("node {node}: first child {child} has parent {actual:?}")]
    ParentMismatch {
        node: usize,
        child: usize,
        actual: Option<usize>,
    },
    #[error("first-child links starting at node {start} form a cycle")]
    Cycle { start: usize },
    #[error("relation table has {relations} rows for {contours} contours")]
    LengthMismatch { contours: usize, relations: usize },
}

/// Index links of one node. `None` means "no such node".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinks {
    pub next: Option<usize>,
    pub prev: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

impl NodeLinks {
    /// Decode one `[next, prev, first_child, parent]` row where negative
    /// values stand for "none".
    pub fn from_row(row: [i32; 4]) -> Self {
        let link = |v: i32| usize::try_from(v).ok();
        Self {
            next: link(row[0]),
            prev: link(row[1]),
            first_child: link(row[2]),
            parent: link(row[3]),
        }
    }

    fn named(&self) -> [(&'static str, Option<usize>); 4] {
        [
            ("next", self.next),
            ("prev", self.prev),
            ("first_child", self.first_child),
            ("parent", self.parent),
        ]
    }
}

/// One closed polyline of the hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourNode {
    /// Index of this node in its hierarchy.
    pub id: usize,
    /// Polyline points in tracing order; the curve is implicitly closed.
    pub points: Vec<ContourPoint>,
    pub links: NodeLinks,
}

/// Node ids visited by following `first_child` links from a start node.
///
/// Always holds at least the start node. Every element after the first is
/// the first child of the element before it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Chain(Vec<usize>);

/// A deserialized chain held no nodes.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("a chain must contain at least its head node")]
pub struct EmptyChain;

impl TryFrom<Vec<usize>> for Chain {
    type Error = EmptyChain;

    fn try_from(ids: Vec<usize>) -> Result<Self, Self::Error> {
        if ids.is_empty() {
            return Err(EmptyChain);
        }
        Ok(Self(ids))
    }
}

impl From<Chain> for Vec<usize> {
    fn from(chain: Chain) -> Self {
        chain.0
    }
}

impl Chain {
    /// The node the chain starts from.
    pub fn head(&self) -> usize {
        self.0[0]
    }

    pub fn nodes(&self) -> &[usize] {
        &self.0
    }

    /// Strict descendants of the head, outermost first.
    pub fn descendants(&self) -> &[usize] {
        &self.0[1..]
    }

    /// Node at nesting level `level` (0 is the head).
    pub fn layer(&self, level: usize) -> Option<usize> {
        self.0.get(level).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; a chain always contains its head.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of `first_child` hops covered by the chain.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }
}

/// Forest of contours for a single image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContourHierarchy {
    nodes: Vec<ContourNode>,
}

impl ContourHierarchy {
    /// Build a hierarchy from polylines and their link table.
    ///
    /// Every link must point inside the arena, and a node's first child
    /// must name that node as its parent.
    pub fn new(
        contours: Vec<Vec<ContourPoint>>,
        links: Vec<NodeLinks>,
    ) -> Result<Self, HierarchyError> {
        if contours.len() != links.len() {
            return Err(HierarchyError::LengthMismatch {
                contours: contours.len(),
                relations: links.len(),
            });
        }

        let nodes: Vec<ContourNode> = contours
            .into_iter()
            .zip(links)
            .enumerate()
            .map(|(id, (points, links))| ContourNode { id, points, links })
            .collect();

        let len = nodes.len();
        for node in &nodes {
            for (relation, target) in node.links.named() {
                if let Some(target) = target.filter(|&t| t >= len) {
                    return Err(HierarchyError::DanglingLink {
                        node: node.id,
                        relation,
                        target,
                        len,
                    });
                }
            }
            if let Some(child) = node.links.first_child {
                let actual = nodes[child].links.parent;
                if actual != Some(node.id) {
                    return Err(HierarchyError::ParentMismatch {
                        node: node.id,
                        child,
                        actual,
                    });
                }
            }
        }

        Ok(Self { nodes })
    }

    /// Build from `[next, prev, first_child, parent]` rows with `-1` for
    /// missing links.
    pub fn from_rows(
        contours: Vec<Vec<ContourPoint>>,
        rows: &[[i32; 4]],
    ) -> Result<Self, HierarchyError> {
        let links = rows.iter().copied().map(NodeLinks::from_row).collect();
        Self::new(contours, links)
    }

    /// Build from polylines that only know their parent.
    ///
    /// Children of a node are ordered by index: the lowest-index child is
    /// the first child, and siblings (including top-level nodes) are linked
    /// in index order.
    pub fn from_parents(
        contours: Vec<(Vec<ContourPoint>, Option<usize>)>,
    ) -> Result<Self, HierarchyError> {
        let len = contours.len();
        let mut links = vec![NodeLinks::default(); len];
        let mut last_child: Vec<Option<usize>> = vec![None; len];
        let mut last_root: Option<usize> = None;

        for (id, (_, parent)) in contours.iter().enumerate() {
            links[id].parent = *parent;
            let prev = match *parent {
                Some(p) if p >= len => {
                    return Err(HierarchyError::DanglingLink {
                        node: id,
                        relation: "parent",
                        target: p,
                        len,
                    })
                }
                Some(p) => {
                    if links[p].first_child.is_none() {
                        links[p].first_child = Some(id);
                    }
                    last_child[p].replace(id)
                }
                None => last_root.replace(id),
            };
            if let Some(prev) = prev {
                links[prev].next = Some(id);
                links[id].prev = Some(prev);
            }
        }

        let points = contours.into_iter().map(|(points, _)| points).collect();
        Self::new(points, links)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ContourNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> Option<&ContourNode> {
        self.nodes.get(id)
    }

    /// Points of node `id`, or an empty slice for an unknown id.
    pub fn points(&self, id: usize) -> &[ContourPoint] {
        self.nodes.get(id).map(|n| n.points.as_slice()).unwrap_or(&[])
    }

    /// Follow `first_child` links from `start` until a childless node.
    ///
    /// The walk is bounded by the node count; exceeding it means the links
    /// loop back on themselves.
    pub fn chain(&self, start: usize) -> Result<Chain, HierarchyError> {
        let mut ids = vec![start];
        let mut current = start;
        while let Some(child) = self.nodes.get(current).and_then(|n| n.links.first_child) {
            if ids.len() > self.nodes.len() {
                return Err(HierarchyError::Cycle { start });
            }
            ids.push(child);
            current = child;
        }
        Ok(Chain(ids))
    }

    /// Nesting depth of `start`: the number of `first_child` hops until a
    /// childless node. A node without children has depth 0.
    pub fn depth(&self, start: usize) -> Result<usize, HierarchyError> {
        self.chain(start).map(|chain| chain.depth())
    }
}
