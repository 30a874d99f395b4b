//! Rotations, guarded splaying and splicing across rake boundaries.
use tracing::trace;

use crate::cluster::{ClusterKind, LEFT, RIGHT};
use crate::ops::ClusterOps;
use crate::{ClusterIndex, VertexIndex};

use super::{violation, TopTree};

impl<O: ClusterOps> TopTree<O> {
    /// The parent of a cluster if the cluster is one of its path children.
    pub(super) fn compress_parent(&self, cluster: ClusterIndex) -> Option<ClusterIndex> {
        let parent = self.clusters[cluster].parent?;
        match self.clusters[parent].kind {
            ClusterKind::Compress { children, .. } if children.contains(&cluster) => Some(parent),
            _ => None,
        }
    }

    fn rake_parent(&self, cluster: ClusterIndex) -> Option<ClusterIndex> {
        let parent = self.clusters[cluster].parent?;
        self.clusters[parent].is_rake().then_some(parent)
    }

    /// The compress cluster holding the rake tree that contains `cluster`.
    fn foster_owner(&self, cluster: ClusterIndex) -> ClusterIndex {
        let mut node = cluster;
        loop {
            match self.clusters[node].parent {
                Some(parent) if self.clusters[parent].is_rake() => node = parent,
                Some(parent) => return parent,
                None => violation(cluster, "cluster hangs from no compress cluster"),
            }
        }
    }

    /// Rotates a cluster above its parent.
    ///
    /// Compress clusters are matched by their vertices: the child of `cluster` that touches the
    /// common vertex of the parent moves down to the parent.
    fn rotate(&mut self, cluster: ClusterIndex) {
        let Some(parent) = self.clusters[cluster].parent else {
            violation(cluster, "rotated a cluster without parent")
        };
        let side = self.child_side(parent, cluster);

        let (inner_side, inner) = match self.clusters[cluster].kind {
            ClusterKind::Compress { children, .. } => {
                let ClusterKind::Compress { common, .. } = self.clusters[parent].kind else {
                    violation(parent, "compress cluster below a non-compress parent")
                };
                let boundary = self.clusters[cluster].boundary;
                let Some(inner_side) = boundary.iter().position(|&vertex| vertex == common) else {
                    violation(cluster, "child does not touch the common vertex of its parent")
                };
                (inner_side, children[inner_side])
            }
            ClusterKind::Rake { children } => (1 - side, children[1 - side]),
            ClusterKind::Base { .. } => violation(cluster, "rotated a base cluster"),
        };

        self.set_child(parent, side, inner);
        self.replace_in_parent(parent, cluster);
        self.set_child(cluster, inner_side, parent);

        self.correct_endpoints(parent);
        self.correct_endpoints(cluster);
    }

    /// Splays a compress cluster to the top of its compress tree, stopping below `guard`.
    pub(super) fn guarded_splay(&mut self, cluster: ClusterIndex, guard: Option<ClusterIndex>) {
        while let Some(parent) = self.compress_parent(cluster) {
            if Some(parent) == guard {
                break;
            }

            match self.compress_parent(parent) {
                Some(grand) if Some(grand) != guard => {
                    if self.is_straight(cluster, grand) {
                        self.rotate(parent);
                        self.rotate(cluster);
                    } else {
                        self.rotate(cluster);
                        self.rotate(cluster);
                    }
                }
                _ => self.rotate(cluster),
            }
        }
    }

    /// Whether `cluster` lies on the outer side of its grandparent's common vertex.
    fn is_straight(&self, cluster: ClusterIndex, grand: ClusterIndex) -> bool {
        let ClusterKind::Compress { common, .. } = self.clusters[grand].kind else {
            violation(grand, "compress cluster below a non-compress parent")
        };
        !self.clusters[cluster].has_boundary(common)
    }

    /// Splays a rake cluster to the top of its rake tree.
    pub(super) fn rake_splay(&mut self, cluster: ClusterIndex) {
        while let Some(parent) = self.rake_parent(cluster) {
            match self.rake_parent(parent) {
                Some(grand) => {
                    if self.child_side(grand, parent) == self.child_side(parent, cluster) {
                        self.rotate(parent);
                        self.rotate(cluster);
                    } else {
                        self.rotate(cluster);
                        self.rotate(cluster);
                    }
                }
                None => self.rotate(cluster),
            }
        }
    }

    /// Moves a cluster out of the rake tree it hangs in onto the path of the compress cluster
    /// owning that rake tree. The path child it replaces takes its place in the rake tree.
    ///
    /// A path child is only displaced if its far end is a leaf other than `keep`.
    pub(super) fn splice(
        &mut self,
        cluster: ClusterIndex,
        keep: Option<VertexIndex>,
    ) -> ClusterIndex {
        let mut rakes = Vec::new();
        let mut node = cluster;
        let owner = loop {
            let Some(parent) = self.clusters[node].parent else {
                violation(cluster, "spliced cluster hangs from no compress cluster")
            };
            if !self.clusters[parent].is_rake() {
                break parent;
            }
            rakes.push(parent);
            node = parent;
        };

        let side = self.displaced_side(owner, keep);
        let displaced = self.children(owner)[side];
        trace!(%cluster, %owner, %displaced, "toptree.splice");

        self.replace_in_parent(cluster, displaced);
        self.set_child(owner, side, cluster);

        for rake in rakes {
            self.correct_endpoints(rake);
        }
        self.correct_endpoints(owner);
        owner
    }

    fn displaced_side(&self, owner: ClusterIndex, keep: Option<VertexIndex>) -> usize {
        let pinned = self.clusters[owner]
            .boundary
            .map(|vertex| Some(vertex) == keep || self.forest.degree(vertex) >= 2);

        match pinned {
            [true, true] => violation(owner, "no path child can be displaced"),
            [true, false] => RIGHT,
            _ => LEFT,
        }
    }

    /// Splays and splices `anchor` upwards until it is the root of its component, or a path child
    /// of `guard`. Returns the cluster that ended up there.
    ///
    /// A base cluster that is a path child hands over to its compress parent, whose boundary
    /// still contains the leaf the base cluster was anchoring.
    pub(super) fn splay_to_root(
        &mut self,
        anchor: ClusterIndex,
        guard: Option<ClusterIndex>,
        keep: Option<VertexIndex>,
    ) -> ClusterIndex {
        let mut cluster = anchor;

        if self.clusters[cluster].is_compress() {
            self.do_split(cluster);
        } else if let Some(parent) = self.clusters[cluster].parent {
            self.do_split(parent);
        }

        loop {
            if self.clusters[cluster].is_base() {
                if let Some(parent) = self.compress_parent(cluster) {
                    if Some(parent) == guard {
                        break;
                    }
                    cluster = parent;
                }
            }

            if self.clusters[cluster].is_compress() {
                self.guarded_splay(cluster, guard);
            }

            if guard.is_some() && self.compress_parent(cluster) == guard {
                break;
            }
            let Some(parent) = self.clusters[cluster].parent else {
                break;
            };

            if self.clusters[parent].is_rake() {
                self.rake_splay(parent);
            }

            let owner = self.foster_owner(cluster);
            if Some(owner) != guard {
                self.guarded_splay(owner, guard);
            }

            self.splice(cluster, keep);
            if Some(owner) == guard {
                break;
            }
        }

        cluster
    }
}
