//! Structural consistency checks used by the tests.
use std::collections::HashMap;

use crate::cluster::{ClusterKind, LEFT, RIGHT};
use crate::ops::ClusterOps;
use crate::{ClusterIndex, VertexIndex};

use super::TopTree;

impl<O: ClusterOps> TopTree<O> {
    /// Panics if the hierarchy is not in a consistent resting state.
    pub(crate) fn assert_consistent(&self) {
        assert!(self.split_log.is_empty(), "split clusters remain after an operation");
        assert!(self.garbage.is_empty(), "removed clusters were not freed");
        assert!(self.rakerized.is_empty(), "an expose is pending");

        let mut commons = HashMap::<VertexIndex, ClusterIndex>::new();
        let mut parentless = 0;

        for (cluster, node) in self.clusters.iter() {
            assert!(!node.is_split, "cluster {cluster} is split");
            assert!(!node.deleted, "cluster {cluster} is deleted");
            assert!(node.rakerized.is_none(), "cluster {cluster} is rakerized");
            assert!(node.data.is_some(), "cluster {cluster} has no data");

            match node.parent {
                Some(parent) => {
                    assert!(
                        self.clusters[parent].descendants().contains(&Some(cluster)),
                        "cluster {cluster} is not linked from its parent {parent}"
                    );
                    assert_eq!(node.root_slot, None, "non-root {cluster} has a root slot");
                }
                None => {
                    parentless += 1;
                    let slot = node.root_slot.expect("parentless cluster is not a root");
                    assert_eq!(self.roots[slot], cluster);
                    for vertex in node.boundary {
                        assert_eq!(
                            self.forest.degree(vertex),
                            1,
                            "root {cluster} ends at an inner vertex"
                        );
                    }
                }
            }

            for child in node.descendants().into_iter().flatten() {
                assert_eq!(
                    self.clusters[child].parent,
                    Some(cluster),
                    "child {child} of {cluster}"
                );
            }

            match node.kind {
                ClusterKind::Base { edge } => {
                    let mut endpoints = self.forest.edge_endpoints(edge).unwrap();
                    let mut boundary = node.boundary;
                    endpoints.sort();
                    boundary.sort();
                    assert_eq!(boundary, endpoints);
                    assert_eq!(self.forest.edge_cluster(edge), Some(cluster));
                }
                ClusterKind::Compress {
                    children,
                    fosters,
                    common,
                } => {
                    assert!(
                        commons.insert(common, cluster).is_none(),
                        "vertex {common} is common twice"
                    );
                    for side in [LEFT, RIGHT] {
                        let child = &self.clusters[children[side]];
                        assert!(child.has_boundary(common));
                        assert!(child.has_boundary(node.boundary[side]));
                        assert_ne!(node.boundary[side], common);

                        if let Some(foster) = fosters[side] {
                            assert!(
                                self.clusters[foster].has_boundary(common),
                                "foster of {cluster}"
                            );
                            self.assert_rake_tree(foster, common);
                        }
                    }
                    assert_eq!(self.forest.handle(common), Some(cluster));
                }
                ClusterKind::Rake { children } => {
                    assert_eq!(node.boundary, self.clusters[children[RIGHT]].boundary);
                }
            }
        }

        assert_eq!(parentless, self.roots.len());
        for vertex in self.forest.vertices() {
            match self.forest.degree(vertex) {
                0 => assert_eq!(self.forest.handle(vertex), None),
                1 => {
                    let handle = self.handle(vertex).expect("leaf without handle");
                    assert!(
                        self.clusters.contains(handle),
                        "leaf {vertex} has freed handle {handle}"
                    );
                    assert!(
                        self.clusters[handle].has_boundary(vertex),
                        "leaf {vertex} is not on the boundary of its handle {handle}"
                    );
                    assert_eq!(
                        self.forest.handle(vertex),
                        None,
                        "leaf {vertex} stores a handle"
                    );
                }
                _ => assert!(
                    commons.contains_key(&vertex),
                    "inner vertex {vertex} is never common"
                ),
            }
        }
        for (edge, _) in self.forest.edges() {
            assert!(
                self.forest.edge_cluster(edge).is_some(),
                "edge {edge} has no cluster"
            );
        }
    }

    /// Checks that every branch of a rake tree hangs at `hang`.
    fn assert_rake_tree(&self, cluster: ClusterIndex, hang: VertexIndex) {
        let node = &self.clusters[cluster];
        assert!(node.has_boundary(hang), "cluster {cluster} does not hang at {hang}");
        if let ClusterKind::Rake { children } = node.kind {
            for child in children {
                self.assert_rake_tree(child, hang);
            }
        }
    }
}
