//! Soft and hard expose, and the restore that undoes a hard expose.
use tracing::trace;

use crate::cluster::{LEFT, RIGHT};
use crate::ops::ClusterOps;
use crate::{ClusterIndex, VertexIndex};

use super::{violation, TopTree, TopTreeError};

/// Where [`TopTree::soft_expose`] left the two vertices.
#[derive(Debug, Clone, Copy)]
pub(super) struct Exposure {
    /// The root of the component.
    pub(super) root: ClusterIndex,

    /// The left child of the root that connects `v` to the common vertex `w` of the root.
    ///
    /// `None` if `v` and `w` are both leaves, in which case they are the boundary of the root.
    pub(super) connector: Option<ClusterIndex>,

    /// The exposed vertex of smaller degree.
    pub(super) v: VertexIndex,
    pub(super) w: VertexIndex,
}

impl<O: ClusterOps> TopTree<O> {
    /// Splays both vertices to the top of their component.
    ///
    /// The vertex of larger degree becomes the common vertex of the root unless both are leaves.
    /// Afterwards the path between the vertices is made up of the root and at most one child.
    ///
    /// # Errors
    ///
    /// When the vertices lie in different components. The restructuring done so far is kept.
    pub(super) fn soft_expose(
        &mut self,
        v: VertexIndex,
        w: VertexIndex,
    ) -> Result<Exposure, TopTreeError> {
        debug_assert!(
            self.rakerized.is_empty(),
            "structural change during a pending expose"
        );

        let (low, high) = if self.forest.degree(w) >= self.forest.degree(v) {
            (v, w)
        } else {
            (w, v)
        };

        let (Some(low_anchor), Some(high_anchor)) = (self.anchor(low), self.anchor(high)) else {
            return Err(TopTreeError::NotConnected(v, w));
        };

        if self.forest.degree(high) >= 2 {
            let root = self.splay_to_root(high_anchor, None, None);
            let connector = self.splay_to_root(low_anchor, Some(root), Some(high));

            if self.clusters[connector].parent != Some(root) {
                return Err(TopTreeError::NotConnected(v, w));
            }

            self.correct_endpoints(root);
            if self.child_side(root, connector) == RIGHT {
                self.flip(root);
            }

            Ok(Exposure {
                root,
                connector: Some(connector),
                v: low,
                w: high,
            })
        } else {
            let other = self.splay_to_root(high_anchor, None, None);
            let root = self.splay_to_root(low_anchor, None, Some(high));

            if root == other || self.clusters[other].parent.is_some() {
                Ok(Exposure {
                    root,
                    connector: None,
                    v: low,
                    w: high,
                })
            } else {
                Err(TopTreeError::NotConnected(v, w))
            }
        }
    }

    /// Turns the compress clusters above the path between the exposed vertices into rakes, so
    /// that the root has exactly the two vertices as its boundary.
    pub(super) fn hard_expose(&mut self, exposure: Exposure) -> ClusterIndex {
        let Exposure {
            root,
            connector,
            v,
            w,
        } = exposure;

        let Some(connector) = connector else {
            return root;
        };

        self.rakerize(root, LEFT);
        if !self.clusters[connector].has_boundary(v) {
            let children = self.children(connector);
            let Some(side) = children
                .iter()
                .position(|&child| self.clusters[child].has_boundary(w))
            else {
                violation(connector, "no child of the connector reaches the exposed vertex")
            };
            self.rakerize(connector, side);
        }

        for position in (0..self.rakerized.len()).rev() {
            let cluster = self.rakerized[position];
            self.correct_endpoints(cluster);
        }

        debug_assert!(
            self.clusters[root].has_boundary(v) && self.clusters[root].has_boundary(w)
        );
        root
    }

    fn rakerize(&mut self, cluster: ClusterIndex, side: usize) {
        trace!(%cluster, side, "toptree.rakerize");
        self.do_split(cluster);
        self.clusters[cluster].rakerized = Some(side);
        self.rakerized.push(cluster);
    }

    /// Turns rakerized clusters back into compress clusters.
    ///
    /// The clusters are split first, so that modifications of the exposed data reach their
    /// children, and are joined again by the next [`rejoin`](Self::rejoin).
    pub(super) fn restore_exposed(&mut self) {
        if self.rakerized.is_empty() {
            return;
        }

        let mut rakerized = std::mem::take(&mut self.rakerized);
        for &cluster in &rakerized {
            self.do_split(cluster);
            self.clusters[cluster].rakerized = None;
        }
        for &cluster in rakerized.iter().rev() {
            self.correct_endpoints(cluster);
        }

        rakerized.clear();
        self.rakerized = rakerized;
    }

    /// Splays both vertices to the root of their components.
    ///
    /// Returns `None` if the vertices are connected, otherwise the two roots, `None` for an
    /// isolated vertex. A vertex of degree two or more ends up as the common vertex of its root,
    /// a leaf as a boundary vertex of its root.
    pub(super) fn splay_roots(
        &mut self,
        v: VertexIndex,
        w: VertexIndex,
    ) -> Option<[Option<ClusterIndex>; 2]> {
        let w_root = self
            .anchor(w)
            .map(|anchor| self.splay_to_root(anchor, None, None));
        let v_root = self
            .anchor(v)
            .map(|anchor| self.splay_to_root(anchor, None, Some(w)));

        match (v_root, w_root) {
            (Some(v_root), Some(w_root))
                if v_root == w_root || self.clusters[w_root].parent.is_some() =>
            {
                None
            }
            _ => Some([v_root, w_root]),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::toptree::test::{path, star};
    use crate::TopTreeError;

    #[test]
    pub fn restore_reverts_rakerized_clusters() {
        let (mut tree, vertices) = path(6);

        let root = tree.expose(vertices[1], vertices[4]).unwrap();
        assert_eq!(tree.data(root).path(), vec![1, 2, 3]);
        assert!(!tree.rakerized.is_empty());

        tree.restore();
        assert!(tree.rakerized.is_empty());
        tree.assert_consistent();

        let root = tree.roots().next().unwrap();
        assert_eq!(tree.data(root).path(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    pub fn expose_between_leaves_of_a_star() {
        let (mut tree, center, leaves) = star(5);

        let root = tree.expose(leaves[0], leaves[3]).unwrap();
        let mut boundary = tree.boundary(root);
        boundary.sort();
        assert_eq!(boundary, [leaves[0], leaves[3]]);
        assert_eq!(tree.data(root).path(), vec![0, 3]);
        assert_eq!(tree.data(root).size, 5);

        let root = tree.expose(center, leaves[2]).unwrap();
        assert_eq!(tree.data(root).path(), vec![2]);
        tree.restore();
        tree.assert_consistent();
    }

    #[test]
    pub fn soft_expose_of_separate_components() {
        let (mut tree, vertices) = path(3);
        let lonely = tree.add_vertex();

        assert_eq!(
            tree.expose(vertices[0], lonely),
            Err(TopTreeError::NotConnected(vertices[0], lonely))
        );
        tree.assert_consistent();
    }
}
