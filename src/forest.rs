//! The underlying forest whose trees are clustered by a [`TopTree`](crate::TopTree).
use std::iter::FusedIterator;
use thiserror::Error;

use crate::memory::Slab;
use crate::{ClusterIndex, EdgeIndex, VertexIndex};

/// A vertex of the base forest.
#[derive(Debug, Clone, Default)]
pub(crate) struct Vertex {
    /// Neighbouring vertices together with the connecting edges.
    adjacent: Vec<(VertexIndex, EdgeIndex)>,

    /// The compress cluster whose common vertex this is. Unset for leaves and isolated vertices.
    handle: Option<ClusterIndex>,

    /// Rake trees hanging at this vertex while a component is being built.
    rake_trees: [Option<ClusterIndex>; 2],
}

/// An edge of the base forest.
#[derive(Debug, Clone)]
pub(crate) struct Edge<E> {
    endpoints: [VertexIndex; 2],
    data: E,

    /// The base cluster of this edge once the edge is part of a top tree.
    cluster: Option<ClusterIndex>,
}

/// An unrooted forest with user data attached to its edges.
///
/// The forest is the input of [`TopTree::from_forest`](crate::TopTree::from_forest) and is owned by
/// the top tree afterwards, which keeps degrees, adjacency and vertex handles up to date while
/// edges are linked and cut.
///
/// # Example
///
/// ```
/// # use toptree::BaseForest;
/// let mut forest = BaseForest::new();
/// let a = forest.add_vertex();
/// let b = forest.add_vertex();
/// let ab = forest.add_edge(a, b, "ab").unwrap();
/// let (c, bc) = forest.add_leaf(b, "bc").unwrap();
///
/// assert_eq!(forest.degree(b), 2);
/// assert_eq!(forest.edge_endpoints(bc), Some([b, c]));
/// assert_eq!(forest.find_edge(b, a), Some(ab));
/// assert_eq!(forest.edge_data(ab), Some(&"ab"));
/// ```
#[derive(Debug, Clone)]
pub struct BaseForest<E> {
    vertices: Slab<VertexIndex, Vertex>,
    edges: Slab<EdgeIndex, Edge<E>>,
}

impl<E> Default for BaseForest<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> BaseForest<E> {
    /// Create a new empty forest.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a new empty forest with preallocated capacities for vertices and edges.
    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            vertices: Slab::with_capacity(vertices),
            edges: Slab::with_capacity(edges),
        }
    }

    /// Add an isolated vertex.
    pub fn add_vertex(&mut self) -> VertexIndex {
        self.vertices.insert(Vertex::default())
    }

    /// Add an edge between two existing vertices.
    ///
    /// The forest does not check for cycles here; a cyclic input is rejected when the top tree is
    /// built from it.
    ///
    /// # Errors
    ///
    ///  - When either vertex does not exist.
    ///  - When both endpoints are the same vertex.
    pub fn add_edge(
        &mut self,
        a: VertexIndex,
        b: VertexIndex,
        data: E,
    ) -> Result<EdgeIndex, ForestError> {
        for vertex in [a, b] {
            if !self.vertices.contains(vertex) {
                return Err(ForestError::UnknownVertex(vertex));
            }
        }

        if a == b {
            return Err(ForestError::SelfLoop(a));
        }

        Ok(self.insert_edge(a, b, data))
    }

    /// Add a new vertex together with an edge that attaches it to `parent`.
    ///
    /// # Errors
    ///
    /// When the parent vertex does not exist.
    pub fn add_leaf(
        &mut self,
        parent: VertexIndex,
        data: E,
    ) -> Result<(VertexIndex, EdgeIndex), ForestError> {
        if !self.vertices.contains(parent) {
            return Err(ForestError::UnknownVertex(parent));
        }

        let leaf = self.add_vertex();
        let edge = self.insert_edge(parent, leaf, data);
        Ok((leaf, edge))
    }

    /// Returns whether the vertex exists.
    #[inline]
    pub fn contains_vertex(&self, vertex: VertexIndex) -> bool {
        self.vertices.contains(vertex)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of edges incident to a vertex.
    ///
    /// # Panics
    ///
    /// Panics when the vertex does not exist.
    #[inline]
    pub fn degree(&self, vertex: VertexIndex) -> usize {
        self.vertices[vertex].adjacent.len()
    }

    /// Iterates over the neighbours of a vertex together with the connecting edges.
    ///
    /// # Panics
    ///
    /// Panics when the vertex does not exist.
    pub fn neighbours(&self, vertex: VertexIndex) -> Neighbours<'_> {
        Neighbours {
            iter: self.vertices[vertex].adjacent.iter(),
        }
    }

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = VertexIndex> + '_ {
        self.vertices.iter().map(|(vertex, _)| vertex)
    }

    /// Iterates over all edges together with their endpoints.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, [VertexIndex; 2])> + '_ {
        self.edges.iter().map(|(edge, data)| (edge, data.endpoints))
    }

    #[inline]
    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<[VertexIndex; 2]> {
        self.edges.get(edge).map(|edge| edge.endpoints)
    }

    #[inline]
    pub fn edge_data(&self, edge: EdgeIndex) -> Option<&E> {
        self.edges.get(edge).map(|edge| &edge.data)
    }

    /// Finds the edge connecting two vertices.
    ///
    /// Only the adjacency of the endpoint with the smaller degree is scanned.
    pub fn find_edge(&self, a: VertexIndex, b: VertexIndex) -> Option<EdgeIndex> {
        let (from, to) = if self.degree(a) <= self.degree(b) {
            (a, b)
        } else {
            (b, a)
        };
        self.neighbours(from)
            .find(|(neighbour, _)| *neighbour == to)
            .map(|(_, edge)| edge)
    }

    pub(crate) fn insert_edge(&mut self, a: VertexIndex, b: VertexIndex, data: E) -> EdgeIndex {
        let edge = self.edges.insert(Edge {
            endpoints: [a, b],
            data,
            cluster: None,
        });
        self.vertices[a].adjacent.push((b, edge));
        self.vertices[b].adjacent.push((a, edge));
        edge
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeIndex) -> E {
        let Edge { endpoints, data, .. } = self.edges.remove(edge).expect("invalid key");

        for vertex in endpoints {
            let adjacent = &mut self.vertices[vertex].adjacent;
            if let Some(position) = adjacent.iter().position(|(_, e)| *e == edge) {
                adjacent.swap_remove(position);
            }
        }

        data
    }

    /// The single edge of a leaf, or any incident edge of an inner vertex.
    #[inline]
    pub(crate) fn first_edge(&self, vertex: VertexIndex) -> Option<EdgeIndex> {
        self.vertices[vertex].adjacent.first().map(|(_, edge)| *edge)
    }

    #[inline]
    pub(crate) fn handle(&self, vertex: VertexIndex) -> Option<ClusterIndex> {
        self.vertices[vertex].handle
    }

    #[inline]
    pub(crate) fn set_handle(&mut self, vertex: VertexIndex, handle: Option<ClusterIndex>) {
        self.vertices[vertex].handle = handle;
    }

    #[inline]
    pub(crate) fn take_rake_trees(&mut self, vertex: VertexIndex) -> [Option<ClusterIndex>; 2] {
        std::mem::take(&mut self.vertices[vertex].rake_trees)
    }

    #[inline]
    pub(crate) fn set_rake_trees(&mut self, vertex: VertexIndex, trees: [Option<ClusterIndex>; 2]) {
        self.vertices[vertex].rake_trees = trees;
    }

    #[inline]
    pub(crate) fn edge_cluster(&self, edge: EdgeIndex) -> Option<ClusterIndex> {
        self.edges.get(edge).and_then(|edge| edge.cluster)
    }

    #[inline]
    pub(crate) fn set_edge_cluster(&mut self, edge: EdgeIndex, cluster: Option<ClusterIndex>) {
        self.edges[edge].cluster = cluster;
    }

    #[inline]
    pub(crate) fn edge_data_mut(&mut self, edge: EdgeIndex) -> &mut E {
        &mut self.edges[edge].data
    }

    #[inline]
    pub(crate) fn edge_ref(&self, edge: EdgeIndex) -> &E {
        &self.edges[edge].data
    }
}

/// Iterator over the neighbours of a vertex. See [`BaseForest::neighbours`].
#[derive(Debug, Clone)]
pub struct Neighbours<'a> {
    iter: std::slice::Iter<'a, (VertexIndex, EdgeIndex)>,
}

impl<'a> Iterator for Neighbours<'a> {
    type Item = (VertexIndex, EdgeIndex);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().copied()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for Neighbours<'a> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

impl<'a> FusedIterator for Neighbours<'a> {}

/// Error returned by [BaseForest::add_edge] and [BaseForest::add_leaf].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexIndex),
    #[error("can not connect vertex {0} to itself")]
    SelfLoop(VertexIndex),
}
