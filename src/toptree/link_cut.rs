//! Linking and cutting edges.
use tracing::debug;

use crate::cluster::{ClusterKind, LEFT, RIGHT};
use crate::ops::ClusterOps;
use crate::{ClusterIndex, VertexIndex};

use super::expose::Exposure;
use super::{violation, Cut, TopTree, TopTreeError};

impl<O: ClusterOps> TopTree<O> {
    /// Connects two components with a new edge.
    ///
    /// Returns the root of the combined component.
    ///
    /// # Errors
    ///
    ///  - When either vertex does not exist.
    ///  - When the vertices are already connected, including `v == w`. The edge payload is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// # use toptree::{ClusterMut, ClusterOps, ClusterRef, TopTree, TopTreeError};
    /// # struct Unit;
    /// # impl ClusterOps for Unit {
    /// #     type Edge = ();
    /// #     type Data = ();
    /// #     fn init_data(&mut self) {}
    /// #     fn create(&mut self, _: ClusterMut<'_, ()>, _: &()) {}
    /// #     fn join(
    /// #         &mut self,
    /// #         _: ClusterRef<'_, ()>,
    /// #         _: ClusterRef<'_, ()>,
    /// #         _: ClusterMut<'_, ()>,
    /// #     ) {
    /// #     }
    /// # }
    /// let mut tree = TopTree::new(Unit);
    /// let a = tree.add_vertex();
    /// let b = tree.add_vertex();
    ///
    /// let root = tree.link(a, b, ()).unwrap();
    /// assert_eq!(tree.root_count(), 1);
    /// assert_eq!(tree.component_root(a), Some(root));
    /// assert_eq!(tree.link(b, a, ()), Err(TopTreeError::AlreadyConnected(b, a)));
    /// ```
    pub fn link(
        &mut self,
        v: VertexIndex,
        w: VertexIndex,
        edge: O::Edge,
    ) -> Result<ClusterIndex, TopTreeError> {
        debug!(%v, %w, "toptree.link");
        self.settle();
        self.check_vertex(v)?;
        self.check_vertex(w)?;

        if v == w {
            return Err(TopTreeError::AlreadyConnected(v, w));
        }

        let (low, high) = if self.forest.degree(v) <= self.forest.degree(w) {
            (v, w)
        } else {
            (w, v)
        };

        let Some([low_root, high_root]) = self.splay_roots(low, high) else {
            self.rejoin();
            return Err(TopTreeError::AlreadyConnected(v, w));
        };

        let low_degree = self.forest.degree(low);
        let high_degree = self.forest.degree(high);
        for root in [low_root, high_root].into_iter().flatten() {
            self.remove_root(root);
        }

        let edge = self.forest.insert_edge(low, high, edge);
        let base = self.construct_base(edge);

        let low_side = match low_root {
            None => base,
            Some(root) if low_degree == 1 => self.construct_compress(root, base),
            Some(root) => {
                self.graft(root, base);
                root
            }
        };

        let root = match high_root {
            None => low_side,
            Some(root) if high_degree == 1 => self.construct_compress(low_side, root),
            Some(root) => {
                self.graft(root, low_side);
                root
            }
        };

        self.add_root(root);
        self.rejoin();
        Ok(root)
    }

    /// Removes the edge between two vertices.
    ///
    /// # Errors
    ///
    ///  - When either vertex does not exist.
    ///  - When the vertices are connected, but not by an edge, including `v == w`.
    ///  - When the vertices lie in different components.
    ///
    /// The hierarchy is left untouched on error.
    pub fn cut(&mut self, v: VertexIndex, w: VertexIndex) -> Result<Cut<O::Edge>, TopTreeError> {
        debug!(%v, %w, "toptree.cut");
        self.settle();
        self.check_vertex(v)?;
        self.check_vertex(w)?;

        if v == w {
            return Err(TopTreeError::NotAnEdge(v, w));
        }

        let Some(edge) = self.forest.find_edge(v, w) else {
            return match (self.component_root(v), self.component_root(w)) {
                (Some(a), Some(b)) if a == b => Err(TopTreeError::NotAnEdge(v, w)),
                _ => Err(TopTreeError::NotConnected(v, w)),
            };
        };

        let exposure = match self.soft_expose(v, w) {
            Ok(exposure) => exposure,
            Err(err) => {
                self.rejoin();
                return Err(err);
            }
        };
        let Exposure {
            root,
            connector,
            v: low,
            w: high,
        } = exposure;

        let Some(base) = self.forest.edge_cluster(edge) else {
            violation(root, "linked edge has no base cluster")
        };

        self.remove_root(root);
        self.do_split(base);
        let payload = self.forest.remove_edge(edge);

        let roots = if root == base {
            [None, None]
        } else if connector == Some(base) {
            [None, Some(self.detach_child(root, base))]
        } else {
            let Some(connector) = connector else {
                violation(root, "exposed edge is neither the root nor below it")
            };
            if self.clusters[base].parent != Some(connector) {
                violation(connector, "exposed edge is not a child of the connector");
            }
            let high_root = self.detach_child(root, connector);
            let low_root = self.detach_child(connector, base);
            [Some(low_root), Some(high_root)]
        };

        self.retire(base);
        for root in roots.into_iter().flatten() {
            self.add_root(root);
        }
        self.rejoin();

        for vertex in [low, high] {
            if self.forest.degree(vertex) < 2 {
                self.forest.set_handle(vertex, None);
            }
        }

        let roots = if low == v {
            roots
        } else {
            [roots[1], roots[0]]
        };
        Ok(Cut {
            roots,
            edge: payload,
        })
    }

    /// Hangs `branch` off the common vertex of the root cluster `node`.
    ///
    /// The branch becomes the right path child of `node`; the previous right child moves into
    /// the right foster.
    fn graft(&mut self, node: ClusterIndex, branch: ClusterIndex) {
        self.do_split(node);

        let ClusterKind::Compress {
            children, fosters, ..
        } = self.clusters[node].kind
        else {
            violation(node, "grafted onto a cluster that is not a compress cluster")
        };

        let old = children[RIGHT];
        let foster = match fosters[RIGHT] {
            None => old,
            Some(foster) => self.construct_rake(foster, old),
        };

        self.set_child(node, RIGHT, branch);
        self.set_foster(node, RIGHT, Some(foster));
        self.correct_endpoints(node);
    }

    /// Removes a path child from a compress cluster and returns the root of what remains.
    ///
    /// A branch from the fosters takes the place of the child. Without fosters the cluster is
    /// removed and its other path child remains.
    fn detach_child(&mut self, node: ClusterIndex, child: ClusterIndex) -> ClusterIndex {
        let side = self.child_side(node, child);
        self.clusters[child].parent = None;

        if let Some(leaf) = self.take_foster_leaf(node, side) {
            self.set_child(node, side, leaf);
            self.correct_endpoints(node);
            node
        } else {
            let other = self.children(node)[1 - side];
            self.clusters[other].parent = None;
            self.retire(node);
            other
        }
    }

    /// Takes one branch out of the fosters of a compress cluster.
    ///
    /// Prefers the foster on `side`. From a rake tree the rightmost branch is taken.
    fn take_foster_leaf(&mut self, node: ClusterIndex, side: usize) -> Option<ClusterIndex> {
        let ClusterKind::Compress { fosters, .. } = self.clusters[node].kind else {
            violation(node, "only compress clusters have fosters")
        };

        let (slot, top) = match fosters {
            [left, right] if side == LEFT => left.map(|f| (LEFT, f)).or(right.map(|f| (RIGHT, f))),
            [left, right] => right.map(|f| (RIGHT, f)).or(left.map(|f| (LEFT, f))),
        }?;

        if !self.clusters[top].is_rake() {
            self.set_foster(node, slot, None);
            self.clusters[top].parent = None;
            return Some(top);
        }

        let mut rake = top;
        loop {
            let right = self.children(rake)[RIGHT];
            if !self.clusters[right].is_rake() {
                break;
            }
            rake = right;
        }

        self.do_split(rake);
        self.rake_splay(rake);

        let [rest, leaf] = self.children(rake);
        self.replace_in_parent(rake, rest);
        self.retire(rake);
        self.clusters[leaf].parent = None;
        Some(leaf)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use crate::toptree::test::{path, star, tree_with, Aggregate};
    use crate::{TopTree, TopTreeError};

    #[test]
    pub fn link_isolated_vertices() {
        let mut tree = TopTree::new(Aggregate);
        let [a, b, c] = [(); 3].map(|_| tree.add_vertex());

        tree.link(a, b, 5).unwrap();
        tree.link(b, c, 7).unwrap();
        tree.assert_consistent();

        let root = tree.expose(a, c).unwrap();
        let mut boundary = tree.boundary(root);
        boundary.sort();
        assert_eq!(boundary, [a, c]);
        assert_eq!(tree.data(root).path(), vec![5, 7]);
        assert_eq!(tree.data(root).max, 7);
        assert_eq!(tree.root_count(), 1);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    pub fn cut_path_in_the_middle(#[case] position: usize) {
        let (mut tree, vertices) = path(5);

        let cut = tree.cut(vertices[position], vertices[position + 1]).unwrap();
        assert_eq!(cut.edge, position as i64);
        tree.assert_consistent();

        // The right side keeps `3 - position` edges; without edges it has no root.
        let right_edges = 3 - position;
        assert_eq!(tree.root_count(), if right_edges == 0 { 1 } else { 2 });
        assert_eq!(cut.roots[1].is_none(), right_edges == 0);

        let [left, right] = cut.roots;
        assert_eq!(tree.component_root(vertices[0]), left);
        assert_eq!(tree.component_root(vertices[4]), right);

        let root = tree.expose(vertices[0], vertices[position]).unwrap();
        assert_eq!(tree.data(root).size, position);
        assert_eq!(
            tree.expose(vertices[0], vertices[4]),
            Err(TopTreeError::NotConnected(vertices[0], vertices[4]))
        );
    }

    #[test]
    pub fn cut_leaf_edges() {
        let (mut tree, vertices) = path(3);

        let cut = tree.cut(vertices[1], vertices[0]).unwrap();
        assert_eq!(cut.roots[1], None);
        assert_eq!(tree.handle(vertices[0]), None);

        let cut = tree.cut(vertices[2], vertices[1]).unwrap();
        assert_eq!(cut.roots, [None, None]);
        assert_eq!(tree.root_count(), 0);
        assert_eq!(tree.cluster_count(), 0);
        tree.assert_consistent();
    }

    #[test]
    pub fn cut_star_center() {
        let (mut tree, center, leaves) = star(6);

        for (i, &leaf) in leaves.iter().enumerate() {
            tree.cut(center, leaf).unwrap();
            tree.assert_consistent();
            assert_eq!(tree.degree(center), 5 - i);
        }
        assert_eq!(tree.root_count(), 0);
    }

    #[test]
    pub fn failed_cut_leaves_the_tree_untouched() {
        let (mut tree, vertices) = path(4);
        let lonely = tree.add_vertex();
        tree.restore();
        let clusters = format!("{:?}", tree);

        assert_eq!(
            tree.cut(vertices[0], vertices[2]),
            Err(TopTreeError::NotAnEdge(vertices[0], vertices[2]))
        );
        assert_eq!(
            tree.cut(vertices[0], lonely),
            Err(TopTreeError::NotConnected(vertices[0], lonely))
        );
        assert_eq!(
            tree.cut(vertices[3], vertices[3]),
            Err(TopTreeError::NotAnEdge(vertices[3], vertices[3]))
        );
        assert_eq!(format!("{:?}", tree), clusters);
    }

    #[test]
    pub fn link_errors() {
        let (mut tree, vertices) = path(3);

        assert_eq!(
            tree.link(vertices[0], vertices[2], 9),
            Err(TopTreeError::AlreadyConnected(vertices[0], vertices[2]))
        );
        assert_eq!(
            tree.link(vertices[1], vertices[1], 9),
            Err(TopTreeError::AlreadyConnected(vertices[1], vertices[1]))
        );
        tree.assert_consistent();
        assert_eq!(tree.forest().edge_count(), 2);
    }

    #[test]
    pub fn relink_branches() {
        let mut tree = tree_with(&[(0, 1), (1, 2), (1, 3), (3, 4), (3, 5), (5, 6)]);
        let v = |i: u32| crate::VertexIndex(i);

        let cut = tree.cut(v(3), v(1)).unwrap();
        tree.assert_consistent();
        assert_eq!(cut.edge, 2);

        tree.link(v(6), v(2), 10).unwrap();
        tree.assert_consistent();

        let root = tree.expose(v(0), v(4)).unwrap();
        assert_eq!(tree.data(root).path(), vec![0, 1, 3, 4, 5, 10]);
        assert_eq!(tree.data(root).max, 10);
        assert_eq!(tree.data(root).size, 6);
    }
}
