//! The splay-based top tree engine.
//!
//! Every connected component is represented by one binary *compress tree* whose in-order
//! sequence is the root path of the component. The branches hanging off a path vertex are
//! collected in *rake trees* attached to the compress cluster of that vertex as fosters. Both kinds
//! of trees are kept balanced by splaying. Splicing moves a compress tree out of a foster onto the
//! path above it so that splaying can continue past rake boundaries.
//!
//! Cached cluster data is maintained lazily. Before the children of a cluster change, the cluster
//! and all its ancestors are split top-down; every operation ends by joining all split clusters
//! bottom-up again.
use std::fmt::{self, Debug};
use thiserror::Error;
use tracing::debug;

use crate::cluster::{Cluster, ClusterKind, LEFT, RIGHT};
use crate::forest::BaseForest;
use crate::memory::Slab;
use crate::ops::ClusterOps;
use crate::{ClusterIndex, EdgeIndex, VertexIndex};

mod build;
mod expose;
mod lifecycle;
mod link_cut;
mod splay;

#[cfg(test)]
mod check;

/// A forest of top trees over a [`BaseForest`].
///
/// The strategy `O` decides what data every cluster carries. See the [crate documentation](crate)
/// for an example.
pub struct TopTree<O: ClusterOps> {
    forest: BaseForest<O::Edge>,
    clusters: Slab<ClusterIndex, Cluster<O::Data>>,

    /// One root cluster per component with at least one edge.
    roots: Vec<ClusterIndex>,

    ops: O,

    /// Clusters split by the running operation, in the order in which they were split.
    split_log: Vec<ClusterIndex>,

    /// Compress clusters turned into rakes by the last expose, top-down.
    rakerized: Vec<ClusterIndex>,

    /// Clusters removed by the running operation.
    garbage: Vec<ClusterIndex>,
}

/// The result of [`TopTree::cut`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut<E> {
    /// The roots of the two components, in the order of the vertices passed to `cut`.
    ///
    /// A vertex that lost its last edge is isolated and has no root.
    pub roots: [Option<ClusterIndex>; 2],

    /// The payload of the removed edge.
    pub edge: E,
}

impl<O: ClusterOps> TopTree<O> {
    /// Create an empty top tree using the given strategy.
    pub fn new(ops: O) -> Self {
        Self::with_capacity(ops, 0, 0)
    }

    /// Create an empty top tree with preallocated capacities for vertices and edges.
    pub fn with_capacity(ops: O, vertices: usize, edges: usize) -> Self {
        Self::from_parts(BaseForest::with_capacity(vertices, edges), ops)
    }

    fn from_parts(forest: BaseForest<O::Edge>, ops: O) -> Self {
        let clusters = Slab::with_capacity(2 * forest.edge_count());
        Self {
            forest,
            clusters,
            roots: Vec::new(),
            ops,
            split_log: Vec::new(),
            rakerized: Vec::new(),
            garbage: Vec::new(),
        }
    }

    /// Add an isolated vertex.
    pub fn add_vertex(&mut self) -> VertexIndex {
        self.forest.add_vertex()
    }

    /// Exposes the path between `v` and `w`.
    ///
    /// Returns the root of the component, which now has `v` and `w` as its boundary vertices. Its
    /// data summarizes the path between them, with everything else raked onto it. The data may be
    /// modified through [`data_mut`](Self::data_mut) until the next operation; the modification
    /// reaches the rest of the hierarchy through [`ClusterOps::split`].
    ///
    /// # Errors
    ///
    ///  - When either vertex does not exist.
    ///  - When `v` equals `w`.
    ///  - When the vertices lie in different components.
    pub fn expose(&mut self, v: VertexIndex, w: VertexIndex) -> Result<ClusterIndex, TopTreeError> {
        debug!(%v, %w, "toptree.expose");
        self.settle();
        self.check_vertex(v)?;
        self.check_vertex(w)?;

        if v == w {
            return Err(TopTreeError::SameVertex(v));
        }

        let result = self
            .soft_expose(v, w)
            .map(|exposure| self.hard_expose(exposure));
        self.rejoin();
        result
    }

    /// Undoes the restructuring of the last [`expose`](Self::expose) and rejoins a root split by
    /// [`split_root`](Self::split_root).
    ///
    /// Every other operation does this first, so calling it is only needed to bring the cached
    /// data of the whole hierarchy up to date.
    pub fn restore(&mut self) {
        debug!("toptree.restore");
        self.settle();
    }

    /// Splits a root cluster and returns its two children.
    ///
    /// Updates stored lazily on the root are pushed into the children, so their data can be read
    /// or modified. The root stays split until the next operation. Returns `None` for a root that
    /// consists of a single edge.
    ///
    /// # Errors
    ///
    /// When the cluster is not a root.
    pub fn split_root(
        &mut self,
        root: ClusterIndex,
    ) -> Result<Option<[ClusterIndex; 2]>, TopTreeError> {
        debug!(%root, "toptree.split_root");
        self.settle();

        match self.clusters.get(root) {
            Some(cluster) if cluster.root_slot.is_some() => {}
            _ => return Err(TopTreeError::NotARoot(root)),
        }

        match self.clusters[root].kind {
            ClusterKind::Base { .. } => Ok(None),
            ClusterKind::Compress { children, .. } | ClusterKind::Rake { children } => {
                self.do_split(root);
                Ok(Some(children))
            }
        }
    }

    /// Returns whether two vertices lie in the same component.
    ///
    /// # Errors
    ///
    /// When either vertex does not exist.
    pub fn connected(&mut self, v: VertexIndex, w: VertexIndex) -> Result<bool, TopTreeError> {
        debug!(%v, %w, "toptree.connected");
        self.settle();
        self.check_vertex(v)?;
        self.check_vertex(w)?;

        if v == w {
            return Ok(true);
        }

        let roots = self.splay_roots(v, w);
        self.rejoin();
        Ok(roots.is_none())
    }

    /// Returns the root cluster of the component of a vertex without restructuring.
    ///
    /// Isolated vertices have no root.
    pub fn component_root(&self, vertex: VertexIndex) -> Option<ClusterIndex> {
        if !self.forest.contains_vertex(vertex) {
            return None;
        }

        let mut cluster = self.anchor(vertex)?;
        while let Some(parent) = self.clusters[cluster].parent {
            cluster = parent;
        }
        Some(cluster)
    }

    /// The data cached in a cluster.
    ///
    /// # Panics
    ///
    /// Panics when the cluster does not exist.
    #[inline]
    pub fn data(&self, cluster: ClusterIndex) -> &O::Data {
        self.clusters[cluster].data()
    }

    /// Mutable access to the data cached in a cluster.
    ///
    /// Only the root returned by the last [`expose`](Self::expose) or the children returned by
    /// the last [`split_root`](Self::split_root) should be modified; changes to other clusters
    /// are overwritten when they are joined again.
    ///
    /// # Panics
    ///
    /// Panics when the cluster does not exist.
    #[inline]
    pub fn data_mut(&mut self, cluster: ClusterIndex) -> &mut O::Data {
        self.clusters[cluster].data_mut()
    }

    /// The boundary vertices of a cluster.
    ///
    /// # Panics
    ///
    /// Panics when the cluster does not exist.
    #[inline]
    pub fn boundary(&self, cluster: ClusterIndex) -> [VertexIndex; 2] {
        self.clusters[cluster].boundary
    }

    /// # Panics
    ///
    /// Panics when the cluster does not exist.
    #[inline]
    pub fn kind(&self, cluster: ClusterIndex) -> ClusterKind {
        self.clusters[cluster].kind
    }

    /// # Panics
    ///
    /// Panics when the cluster does not exist.
    #[inline]
    pub fn parent(&self, cluster: ClusterIndex) -> Option<ClusterIndex> {
        self.clusters[cluster].parent
    }

    /// Iterates over the root clusters, one per component with at least one edge.
    pub fn roots(&self) -> impl ExactSizeIterator<Item = ClusterIndex> + '_ {
        self.roots.iter().copied()
    }

    #[inline]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// The cluster currently representing a vertex.
    ///
    /// For a vertex of degree at least two this is the compress cluster whose common vertex it
    /// is. For a leaf it is the topmost cluster that has the leaf on its boundary. Isolated
    /// vertices have no handle.
    ///
    /// # Panics
    ///
    /// Panics when the vertex does not exist.
    pub fn handle(&self, vertex: VertexIndex) -> Option<ClusterIndex> {
        if self.forest.degree(vertex) != 1 {
            return self.forest.handle(vertex);
        }

        let mut handle = self.anchor(vertex)?;
        let mut cluster = handle;
        while let Some(parent) = self.clusters[cluster].parent {
            cluster = parent;
            if self.clusters[cluster].has_boundary(vertex) {
                handle = cluster;
            }
        }
        Some(handle)
    }

    /// # Panics
    ///
    /// Panics when the vertex does not exist.
    #[inline]
    pub fn degree(&self, vertex: VertexIndex) -> usize {
        self.forest.degree(vertex)
    }

    #[inline]
    pub fn forest(&self) -> &BaseForest<O::Edge> {
        &self.forest
    }

    #[inline]
    pub fn edge_data(&self, edge: EdgeIndex) -> Option<&O::Edge> {
        self.forest.edge_data(edge)
    }

    /// The base cluster of an edge.
    #[inline]
    pub fn edge_cluster(&self, edge: EdgeIndex) -> Option<ClusterIndex> {
        self.forest.edge_cluster(edge)
    }

    #[inline]
    pub fn ops(&self) -> &O {
        &self.ops
    }

    #[inline]
    pub fn ops_mut(&mut self) -> &mut O {
        &mut self.ops
    }

    /// Brings the hierarchy back into its resting state before an operation starts.
    fn settle(&mut self) {
        self.restore_exposed();
        self.rejoin();
    }

    fn check_vertex(&self, vertex: VertexIndex) -> Result<(), TopTreeError> {
        if self.forest.contains_vertex(vertex) {
            Ok(())
        } else {
            Err(TopTreeError::UnknownVertex(vertex))
        }
    }

    /// The cluster from which a vertex is splayed to the root.
    ///
    /// Inner vertices start from their compress cluster, leaves from the base cluster of their
    /// edge.
    fn anchor(&self, vertex: VertexIndex) -> Option<ClusterIndex> {
        match self.forest.degree(vertex) {
            0 => None,
            1 => self
                .forest
                .first_edge(vertex)
                .and_then(|edge| self.forest.edge_cluster(edge)),
            _ => self.forest.handle(vertex),
        }
    }

    fn add_root(&mut self, cluster: ClusterIndex) {
        let node = &mut self.clusters[cluster];
        node.parent = None;
        node.root_slot = Some(self.roots.len());
        self.roots.push(cluster);
    }

    fn remove_root(&mut self, cluster: ClusterIndex) {
        let Some(slot) = self.clusters[cluster].root_slot.take() else {
            return;
        };

        self.roots.swap_remove(slot);
        if let Some(&moved) = self.roots.get(slot) {
            self.clusters[moved].root_slot = Some(slot);
        }
    }

    /// Puts `new` into the place `old` occupies in its parent or in the list of roots.
    fn replace_in_parent(&mut self, old: ClusterIndex, new: ClusterIndex) {
        let parent = self.clusters[old].parent;

        match parent {
            None => {
                if let Some(slot) = self.clusters[old].root_slot.take() {
                    self.roots[slot] = new;
                    self.clusters[new].root_slot = Some(slot);
                }
            }
            Some(parent) => match &mut self.clusters[parent].kind {
                ClusterKind::Compress {
                    children, fosters, ..
                } => {
                    if let Some(side) = children.iter().position(|c| *c == old) {
                        children[side] = new;
                    } else if let Some(side) = fosters.iter().position(|f| *f == Some(old)) {
                        fosters[side] = Some(new);
                    } else {
                        violation(parent, "cluster is not linked from its parent");
                    }
                }
                ClusterKind::Rake { children } => match children.iter().position(|c| *c == old) {
                    Some(side) => children[side] = new,
                    None => violation(parent, "cluster is not linked from its parent"),
                },
                ClusterKind::Base { .. } => violation(parent, "base cluster has a child"),
            },
        }

        self.clusters[new].parent = parent;
    }

    fn set_child(&mut self, parent: ClusterIndex, side: usize, child: ClusterIndex) {
        match &mut self.clusters[parent].kind {
            ClusterKind::Compress { children, .. } | ClusterKind::Rake { children } => {
                children[side] = child
            }
            ClusterKind::Base { .. } => violation(parent, "base cluster can not have children"),
        }
        self.clusters[child].parent = Some(parent);
    }

    fn set_foster(&mut self, parent: ClusterIndex, side: usize, foster: Option<ClusterIndex>) {
        match &mut self.clusters[parent].kind {
            ClusterKind::Compress { fosters, .. } => fosters[side] = foster,
            _ => violation(parent, "only compress clusters have fosters"),
        }
        if let Some(foster) = foster {
            self.clusters[foster].parent = Some(parent);
        }
    }

    fn children(&self, cluster: ClusterIndex) -> [ClusterIndex; 2] {
        match self.clusters[cluster].kind {
            ClusterKind::Compress { children, .. } | ClusterKind::Rake { children } => children,
            ClusterKind::Base { .. } => violation(cluster, "base cluster has no children"),
        }
    }

    fn child_side(&self, parent: ClusterIndex, child: ClusterIndex) -> usize {
        match self.children(parent) {
            [left, _] if left == child => LEFT,
            [_, right] if right == child => RIGHT,
            _ => violation(parent, "cluster is not a child of its parent"),
        }
    }
}

impl<O> Debug for TopTree<O>
where
    O: ClusterOps,
    O::Edge: Debug,
    O::Data: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopTree")
            .field("forest", &self.forest)
            .field("clusters", &self.clusters)
            .field("roots", &self.roots)
            .finish()
    }
}

/// Aborts on a broken structural invariant of the cluster hierarchy.
#[cold]
#[track_caller]
fn violation(cluster: ClusterIndex, message: &str) -> ! {
    panic!("top tree invariant violated at cluster {cluster}: {message}")
}

/// Error returned by the operations of [`TopTree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopTreeError {
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexIndex),
    #[error("can not expose a path from vertex {0} to itself")]
    SameVertex(VertexIndex),
    #[error("vertices {0} and {1} are already connected")]
    AlreadyConnected(VertexIndex, VertexIndex),
    #[error("vertices {0} and {1} are not connected")]
    NotConnected(VertexIndex, VertexIndex),
    #[error("vertices {0} and {1} are not joined by an edge")]
    NotAnEdge(VertexIndex, VertexIndex),
    #[error("the base forest contains a cycle through vertex {0}")]
    Cycle(VertexIndex),
    #[error("cluster {0} is not a root")]
    NotARoot(ClusterIndex),
}
