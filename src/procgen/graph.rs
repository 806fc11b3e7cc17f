//! Planar graph construction from a set of streamlines.
//!
//! Grounded on the teacher's `procgen::roads::RoadGraph` (petgraph `UnGraph`
//! plus a linear node-position index for snap-or-create lookups),
//! generalized so edges also split wherever two streamlines cross, which
//! the teacher's graph never needed to do because it only ever snapped
//! nearby endpoints together.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{GenError, Result};
use crate::geometry::{segment_intersection, Vector};

/// A node in the road network: an intersection, a dead end, or a point
/// where one streamline crosses another.
#[derive(Clone, Debug)]
pub struct RoadNode {
    pub position: Vector,
}

/// An edge in the road network: a straight chord between two adjacent
/// graph nodes along a streamline.
#[derive(Clone, Debug)]
pub struct RoadEdge {
    pub points: SmallVec<[Vector; 8]>,
    pub length: f64,
}

impl RoadEdge {
    fn new(a: Vector, b: Vector) -> Self {
        let mut points = SmallVec::new();
        points.push(a);
        points.push(b);
        Self { length: a.distance(b), points }
    }
}

pub struct PlanarGraph {
    pub graph: UnGraph<RoadNode, RoadEdge>,
    node_positions: Vec<(NodeIndex, Vector)>,
}

impl PlanarGraph {
    fn new() -> Self {
        Self { graph: UnGraph::new_undirected(), node_positions: Vec::new() }
    }

    fn find_nearest(&self, position: Vector, max_distance: f64) -> Option<NodeIndex> {
        self.node_positions
            .iter()
            .map(|&(idx, pos)| (idx, position.distance(pos)))
            .filter(|&(_, d)| d <= max_distance)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(idx, _)| idx)
    }

    fn snap_or_create(&mut self, position: Vector, snap_distance: f64) -> NodeIndex {
        if let Some(existing) = self.find_nearest(position, snap_distance) {
            existing
        } else {
            let idx = self.graph.add_node(RoadNode { position });
            self.node_positions.push((idx, position));
            idx
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &RoadNode)> {
        self.graph.node_indices().map(|i| (i, &self.graph[i]))
    }

    pub fn edge_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    pub fn edge_by_index(&self, idx: EdgeIndex) -> Option<&RoadEdge> {
        self.graph.edge_weight(idx)
    }

    pub fn node_by_index(&self, idx: NodeIndex) -> Option<&RoadNode> {
        self.graph.node_weight(idx)
    }

    /// Edges incident to `node`, sorted counter-clockwise starting from the
    /// +x axis. Polygon face extraction ("always take the next edge
    /// clockwise from the one you arrived on") depends on this ordering.
    pub fn sorted_neighbors(&self, node: NodeIndex) -> Vec<(NodeIndex, EdgeIndex)> {
        let here = self.graph[node].position;
        let mut out: Vec<(NodeIndex, EdgeIndex, f64)> = self
            .graph
            .edges(node)
            .map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                let dir = self.graph[other].position - here;
                (other, e.id(), dir.angle())
            })
            .collect();
        out.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap());
        out.into_iter().map(|(n, e, _)| (n, e)).collect()
    }
}

fn cumulative_arc_lengths(points: &[Vector]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    lengths.push(0.0);
    for w in points.windows(2) {
        acc += w[0].distance(w[1]);
        lengths.push(acc);
    }
    lengths
}

/// Builds the planar graph from a set of already-simplified streamline
/// polylines. Nodes are placed at every polyline vertex and at every point
/// where two streamlines cross; edges connect adjacent nodes along the
/// original streamline order. `snap_distance` merges near-duplicate nodes
/// (streamline endpoints that nearly but not exactly coincide).
pub fn build_planar_graph(streamlines: &[Vec<Vector>], snap_distance: f64) -> Result<PlanarGraph> {
    let mut cuts: Vec<Vec<(f64, Vector)>> = streamlines
        .iter()
        .map(|line| {
            let arc = cumulative_arc_lengths(line);
            line.iter().cloned().zip(arc).map(|(p, a)| (a, p)).collect()
        })
        .collect();

    for i in 0..streamlines.len() {
        for j in (i + 1)..streamlines.len() {
            let arc_i = cumulative_arc_lengths(&streamlines[i]);
            let arc_j = cumulative_arc_lengths(&streamlines[j]);
            for (si, seg_i) in streamlines[i].windows(2).enumerate() {
                for (sj, seg_j) in streamlines[j].windows(2).enumerate() {
                    if let Some(hit) = segment_intersection(seg_i[0], seg_i[1], seg_j[0], seg_j[1]) {
                        let arc_at_i = arc_i[si] + hit.t * (arc_i[si + 1] - arc_i[si]);
                        let arc_at_j = arc_j[sj] + hit.u * (arc_j[sj + 1] - arc_j[sj]);
                        cuts[i].push((arc_at_i, hit.point));
                        cuts[j].push((arc_at_j, hit.point));
                    }
                }
            }
        }
    }

    let mut graph = PlanarGraph::new();
    for cut_list in &mut cuts {
        cut_list.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        cut_list.dedup_by(|a, b| a.1.distance(b.1) < 1e-6);

        if cut_list.len() < 2 {
            continue;
        }
        let node_indices: Vec<NodeIndex> = cut_list.iter().map(|&(_, p)| graph.snap_or_create(p, snap_distance)).collect();
        for w in node_indices.windows(2) {
            let (a, b) = (w[0], w[1]);
            if a == b {
                continue;
            }
            if graph.graph.find_edge(a, b).is_some() {
                continue;
            }
            let pa = graph.graph[a].position;
            let pb = graph.graph[b].position;
            if pa.distance(pb) < 1e-9 {
                continue;
            }
            graph.graph.add_edge(a, b, RoadEdge::new(pa, pb));
        }
    }

    if graph.node_count() == 0 {
        return Err(GenError::GraphDegenerate);
    }

    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "planar graph built");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_streamlines_produce_a_shared_node() {
        let a = vec![Vector::new(-10.0, 0.0), Vector::new(10.0, 0.0)];
        let b = vec![Vector::new(0.0, -10.0), Vector::new(0.0, 10.0)];
        let graph = build_planar_graph(&[a, b], 1e-3).unwrap();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn disjoint_streamlines_do_not_share_nodes() {
        let a = vec![Vector::new(-10.0, 0.0), Vector::new(10.0, 0.0)];
        let b = vec![Vector::new(-10.0, 100.0), Vector::new(10.0, 100.0)];
        let graph = build_planar_graph(&[a, b], 1e-3).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn sorted_neighbors_are_angle_ordered() {
        let a = vec![Vector::new(-10.0, 0.0), Vector::new(10.0, 0.0)];
        let b = vec![Vector::new(0.0, -10.0), Vector::new(0.0, 10.0)];
        let graph = build_planar_graph(&[a, b], 1e-3).unwrap();
        let centre = graph.nodes().find(|(_, n)| n.position.distance(Vector::ZERO) < 1e-6).unwrap().0;
        let neighbors = graph.sorted_neighbors(centre);
        assert_eq!(neighbors.len(), 4);
        let angles: Vec<f64> = neighbors.iter().map(|&(n, _)| graph.graph[n].position.angle()).collect();
        for w in angles.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }
}
