//! Building balanced top trees for a whole base forest at once.
use bitvec::prelude::*;
use tracing::{debug, trace};

use crate::forest::BaseForest;
use crate::ops::ClusterOps;
use crate::{ClusterIndex, EdgeIndex, VertexIndex};

use super::{TopTree, TopTreeError};

/// A path of the forest decomposition, from its attachment vertex to a leaf.
#[derive(Debug, Default)]
struct PathPlan {
    vertices: Vec<VertexIndex>,
    edges: Vec<EdgeIndex>,

    /// The plan and the position on its path this path hangs from.
    owner: Option<(usize, usize)>,

    /// Roots of the paths hanging from each vertex of this path.
    branches: Vec<Vec<ClusterIndex>>,
}

/// A branch that still has to be traced.
#[derive(Debug, Clone, Copy)]
struct PendingBranch {
    hang: VertexIndex,
    edge: EdgeIndex,
    next: VertexIndex,
    owner: (usize, usize),
}

type Merge<O> = fn(&mut TopTree<O>, ClusterIndex, ClusterIndex) -> ClusterIndex;

impl<O: ClusterOps> TopTree<O> {
    /// Builds a top tree for every tree of a base forest.
    ///
    /// Every tree is decomposed into paths starting at a leaf. Each path is clustered by a
    /// balanced compress tree and the paths hanging off a vertex by a balanced rake tree.
    ///
    /// # Errors
    ///
    /// When the base forest contains a cycle.
    ///
    /// # Example
    ///
    /// ```
    /// # use toptree::{BaseForest, ClusterMut, ClusterOps, ClusterRef, TopTree, TopTreeError};
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
    /// let mut forest = BaseForest::new();
    /// let a = forest.add_vertex();
    /// let (b, _) = forest.add_leaf(a, ()).unwrap();
    /// let (c, _) = forest.add_leaf(b, ()).unwrap();
    /// let lonely = forest.add_vertex();
    ///
    /// let tree = TopTree::from_forest(forest.clone(), Unit).unwrap();
    /// assert_eq!(tree.root_count(), 1);
    /// assert_eq!(tree.component_root(lonely), None);
    ///
    /// forest.add_edge(c, a, ()).unwrap();
    /// assert!(matches!(TopTree::from_forest(forest, Unit), Err(TopTreeError::Cycle(_))));
    /// ```
    pub fn from_forest(forest: BaseForest<O::Edge>, ops: O) -> Result<Self, TopTreeError> {
        debug!(
            vertices = forest.vertex_count(),
            edges = forest.edge_count(),
            "toptree.from_forest"
        );
        let mut tree = Self::from_parts(forest, ops);
        tree.build()?;
        Ok(tree)
    }

    fn build(&mut self) -> Result<(), TopTreeError> {
        let plans = self.trace_paths()?;
        let path_count = plans.len();
        self.cluster_paths(plans);

        if let Some((_, [a, _])) = self
            .forest
            .edges()
            .find(|&(edge, _)| self.forest.edge_cluster(edge).is_none())
        {
            return Err(TopTreeError::Cycle(a));
        }

        trace!(paths = path_count, roots = self.roots.len(), "toptree.build");
        Ok(())
    }

    /// Decomposes every tree into paths, starting from its leaves.
    ///
    /// Plans are numbered so that every path comes after the path it hangs from.
    fn trace_paths(&self) -> Result<Vec<PathPlan>, TopTreeError> {
        let size = self
            .forest
            .vertices()
            .map(|vertex| usize::from(vertex) + 1)
            .max()
            .unwrap_or(0);
        let mut visited = bitvec![0; size];
        let mut plans = Vec::new();
        let mut pending = Vec::new();

        for start in self.forest.vertices() {
            if visited[usize::from(start)] || self.forest.degree(start) != 1 {
                continue;
            }
            visited.set(usize::from(start), true);

            let plan = self.trace_path(
                vec![start],
                Vec::new(),
                None,
                plans.len(),
                &mut visited,
                &mut pending,
            )?;
            plans.push(plan);

            while let Some(branch) = pending.pop() {
                let PendingBranch {
                    hang,
                    edge,
                    next,
                    owner,
                } = branch;

                if visited.replace(usize::from(next), true) {
                    return Err(TopTreeError::Cycle(next));
                }

                let plan = self.trace_path(
                    vec![hang, next],
                    vec![edge],
                    Some(owner),
                    plans.len(),
                    &mut visited,
                    &mut pending,
                )?;
                plans.push(plan);
            }
        }

        Ok(plans)
    }

    /// Follows a path until it reaches a leaf, queueing every other edge as a branch.
    fn trace_path(
        &self,
        mut vertices: Vec<VertexIndex>,
        mut edges: Vec<EdgeIndex>,
        owner: Option<(usize, usize)>,
        id: usize,
        visited: &mut BitVec,
        pending: &mut Vec<PendingBranch>,
    ) -> Result<PathPlan, TopTreeError> {
        loop {
            let Some(&current) = vertices.last() else {
                break;
            };
            let arrival = edges.last().copied();
            let position = vertices.len() - 1;

            let mut continuation = None;
            for (neighbour, edge) in self.forest.neighbours(current) {
                if Some(edge) == arrival {
                    continue;
                }
                if continuation.is_none() {
                    continuation = Some((neighbour, edge));
                } else {
                    pending.push(PendingBranch {
                        hang: current,
                        edge,
                        next: neighbour,
                        owner: (id, position),
                    });
                }
            }

            let Some((next, edge)) = continuation else {
                break;
            };
            if visited.replace(usize::from(next), true) {
                return Err(TopTreeError::Cycle(next));
            }
            vertices.push(next);
            edges.push(edge);
        }

        let branches = vec![Vec::new(); vertices.len()];
        Ok(PathPlan {
            vertices,
            edges,
            owner,
            branches,
        })
    }

    /// Clusters the paths, innermost first, hanging each finished path from its owner.
    fn cluster_paths(&mut self, mut plans: Vec<PathPlan>) {
        for id in (0..plans.len()).rev() {
            let plan = std::mem::take(&mut plans[id]);

            for (&vertex, branches) in plan.vertices.iter().zip(plan.branches) {
                if branches.is_empty() {
                    continue;
                }
                let mut left = branches;
                let right = left.split_off(left.len() / 2);
                let trees =
                    [left, right].map(|half| self.merge_balanced(half, Self::construct_rake));
                self.forest.set_rake_trees(vertex, trees);
            }

            let bases = plan
                .edges
                .iter()
                .map(|&edge| self.construct_base(edge))
                .collect();
            let Some(root) = self.merge_balanced(bases, Self::construct_compress) else {
                continue;
            };

            match plan.owner {
                Some((owner, position)) => plans[owner].branches[position].push(root),
                None => self.add_root(root),
            }
        }
    }

    /// Merges neighbouring clusters pairwise until one cluster is left.
    fn merge_balanced(
        &mut self,
        mut clusters: Vec<ClusterIndex>,
        merge: Merge<O>,
    ) -> Option<ClusterIndex> {
        while clusters.len() > 1 {
            let mut merged = Vec::with_capacity((clusters.len() + 1) / 2);
            let mut iter = clusters.into_iter();
            while let Some(left) = iter.next() {
                merged.push(match iter.next() {
                    Some(right) => merge(self, left, right),
                    None => left,
                });
            }
            clusters = merged;
        }
        clusters.pop()
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use crate::toptree::test::{path, star, tree_with, Aggregate};
    use crate::{BaseForest, ClusterKind, TopTree, TopTreeError};

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(8)]
    #[case(33)]
    pub fn build_path(#[case] length: usize) {
        let (mut tree, vertices) = path(length);
        tree.assert_consistent();
        assert_eq!(tree.root_count(), 1);
        assert_eq!(tree.cluster_count(), 2 * (length - 1) - 1);

        let root = tree.expose(vertices[0], vertices[length - 1]).unwrap();
        assert_eq!(tree.data(root).size, length - 1);
        assert_eq!(tree.data(root).max, length as i64 - 2);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    pub fn build_star(#[case] leaves: usize) {
        let (mut tree, center, outer) = star(leaves);
        tree.assert_consistent();
        assert_eq!(tree.degree(center), leaves);

        if leaves >= 2 {
            assert!(matches!(
                tree.kind(tree.handle(center).unwrap()),
                ClusterKind::Compress { common, .. } if common == center
            ));
        }

        let root = tree.expose(outer[0], center).unwrap();
        assert_eq!(tree.data(root).path(), vec![0]);
        assert_eq!(tree.data(root).size, leaves);
    }

    #[test]
    pub fn build_caterpillar() {
        let mut edges = Vec::new();
        for spine in 0..6 {
            edges.push((spine, spine + 1));
            edges.push((spine + 1, spine + 10));
            edges.push((spine + 1, spine + 20));
        }
        let mut tree = tree_with(&edges);
        tree.assert_consistent();
        assert_eq!(tree.root_count(), 1);

        let v = |i: u32| crate::VertexIndex(i);
        let root = tree.expose(v(10), v(25)).unwrap();
        assert_eq!(tree.data(root).path(), vec![1, 3, 6, 9, 12, 15, 17]);
    }

    #[test]
    pub fn build_rejects_cycles() {
        let mut forest = BaseForest::new();
        let a = forest.add_vertex();
        let (b, _) = forest.add_leaf(a, 0).unwrap();
        let (c, _) = forest.add_leaf(b, 1).unwrap();
        forest.add_edge(c, a, 2).unwrap();
        assert!(matches!(
            TopTree::from_forest(forest.clone(), Aggregate),
            Err(TopTreeError::Cycle(_))
        ));

        // A cycle reachable from a leaf.
        forest.add_leaf(a, 3).unwrap();
        assert!(matches!(
            TopTree::from_forest(forest, Aggregate),
            Err(TopTreeError::Cycle(_))
        ));
    }

    #[test]
    pub fn build_isolated_vertices() {
        let mut forest = BaseForest::<i64>::new();
        let a = forest.add_vertex();
        let b = forest.add_vertex();

        let mut tree = TopTree::from_forest(forest, Aggregate).unwrap();
        assert_eq!(tree.root_count(), 0);
        assert_eq!(tree.cluster_count(), 0);
        assert_eq!(
            tree.expose(a, b),
            Err(TopTreeError::NotConnected(a, b))
        );
    }
}
