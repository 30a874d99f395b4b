//! Clusters of a top tree and the views handed to [`ClusterOps`](crate::ClusterOps) callbacks.
use crate::{ClusterIndex, EdgeIndex, VertexIndex};

pub(crate) const LEFT: usize = 0;
pub(crate) const RIGHT: usize = 1;

/// The shape of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterKind {
    /// A single edge of the base forest.
    Base { edge: EdgeIndex },

    /// Two path segments meeting in the `common` vertex.
    ///
    /// `children[i]` contains `boundary[i]` of the cluster. The fosters are rake trees of the
    /// branches hanging off the common vertex; `fosters[i]` is folded onto `children[i]` before
    /// the two sides are concatenated.
    Compress {
        children: [ClusterIndex; 2],
        fosters: [Option<ClusterIndex>; 2],
        common: VertexIndex,
    },

    /// Folds `children[0]` onto `children[1]`. The boundary is the one of `children[1]`.
    Rake { children: [ClusterIndex; 2] },
}

/// A node of the cluster hierarchy as stored in the arena.
#[derive(Debug, Clone)]
pub(crate) struct Cluster<D> {
    pub(crate) boundary: [VertexIndex; 2],
    pub(crate) parent: Option<ClusterIndex>,
    pub(crate) kind: ClusterKind,

    /// Data computed by the user callbacks. Only vacant while a callback runs.
    pub(crate) data: Option<D>,

    /// Data of the virtual rake nodes that fold the fosters of a compress cluster onto its
    /// children. Kept between a join and the following split.
    pub(crate) virtual_data: [Option<D>; 2],

    /// The child that stays on the path while the cluster is exposed as a rake.
    pub(crate) rakerized: Option<usize>,

    pub(crate) is_split: bool,
    pub(crate) deleted: bool,

    /// Position in the list of roots, if this cluster is a root.
    pub(crate) root_slot: Option<usize>,
}

impl<D> Cluster<D> {
    pub(crate) fn new(kind: ClusterKind, boundary: [VertexIndex; 2], data: D) -> Self {
        Self {
            boundary,
            parent: None,
            kind,
            data: Some(data),
            virtual_data: [None, None],
            rakerized: None,
            is_split: true,
            deleted: false,
            root_slot: None,
        }
    }

    #[inline]
    pub(crate) fn data(&self) -> &D {
        self.data.as_ref().expect("cluster data is held by a running callback")
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut D {
        self.data.as_mut().expect("cluster data is held by a running callback")
    }

    /// Children and fosters of the cluster.
    pub(crate) fn descendants(&self) -> [Option<ClusterIndex>; 4] {
        match self.kind {
            ClusterKind::Base { .. } => [None; 4],
            ClusterKind::Compress {
                children, fosters, ..
            } => [Some(children[0]), Some(children[1]), fosters[0], fosters[1]],
            ClusterKind::Rake { children } => [Some(children[0]), Some(children[1]), None, None],
        }
    }

    #[inline]
    pub(crate) fn is_base(&self) -> bool {
        matches!(self.kind, ClusterKind::Base { .. })
    }

    #[inline]
    pub(crate) fn is_compress(&self) -> bool {
        matches!(self.kind, ClusterKind::Compress { .. })
    }

    #[inline]
    pub(crate) fn is_rake(&self) -> bool {
        matches!(self.kind, ClusterKind::Rake { .. })
    }

    #[inline]
    pub(crate) fn has_boundary(&self, vertex: VertexIndex) -> bool {
        self.boundary.contains(&vertex)
    }
}

/// Access to the two boundary vertices of a cluster.
pub trait Boundary {
    fn boundary(&self) -> [VertexIndex; 2];

    #[inline]
    fn left_boundary(&self) -> VertexIndex {
        self.boundary()[LEFT]
    }

    #[inline]
    fn right_boundary(&self) -> VertexIndex {
        self.boundary()[RIGHT]
    }

    /// Returns whether both clusters have the same boundary vertices, in any order.
    #[inline]
    fn same_boundary(&self, other: &impl Boundary) -> bool {
        let [a, b] = self.boundary();
        let [c, d] = other.boundary();
        (a == c && b == d) || (a == d && b == c)
    }
}

/// Read access to a cluster inside a callback.
#[derive(Debug)]
pub struct ClusterRef<'a, D> {
    boundary: [VertexIndex; 2],
    data: &'a D,
}

impl<'a, D> ClusterRef<'a, D> {
    #[inline]
    pub(crate) fn new(boundary: [VertexIndex; 2], data: &'a D) -> Self {
        Self { boundary, data }
    }

    #[inline]
    pub fn data(&self) -> &'a D {
        self.data
    }
}

impl<'a, D> Boundary for ClusterRef<'a, D> {
    #[inline]
    fn boundary(&self) -> [VertexIndex; 2] {
        self.boundary
    }
}

/// Write access to a cluster inside a callback.
#[derive(Debug)]
pub struct ClusterMut<'a, D> {
    boundary: [VertexIndex; 2],
    data: &'a mut D,
}

impl<'a, D> ClusterMut<'a, D> {
    #[inline]
    pub(crate) fn new(boundary: [VertexIndex; 2], data: &'a mut D) -> Self {
        Self { boundary, data }
    }

    #[inline]
    pub fn data(&self) -> &D {
        self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut D {
        self.data
    }
}

impl<'a, D> Boundary for ClusterMut<'a, D> {
    #[inline]
    fn boundary(&self) -> [VertexIndex; 2] {
        self.boundary
    }
}

/// Returns whether `left` is folded onto `right`, so that the parent keeps `right`'s boundary.
#[inline]
pub fn is_left_rake(_left: &impl Boundary, right: &impl Boundary, parent: &impl Boundary) -> bool {
    right.same_boundary(parent)
}

/// Returns whether `right` is folded onto `left`, so that the parent keeps `left`'s boundary.
#[inline]
pub fn is_right_rake(left: &impl Boundary, _right: &impl Boundary, parent: &impl Boundary) -> bool {
    left.same_boundary(parent)
}

/// Returns whether the parent concatenates the paths of `left` and `right`.
#[inline]
pub fn is_compress(left: &impl Boundary, right: &impl Boundary, parent: &impl Boundary) -> bool {
    !is_left_rake(left, right, parent) && !is_right_rake(left, right, parent)
}

/// How a parent cluster combines its two children in a join or split.
///
/// The same callbacks serve compress clusters, rake clusters, the virtual rakes that fold fosters
/// onto the path, and exposed clusters, so the shape is derived from the boundary vertices alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// The parent is the concatenation of two paths.
    Compress,
    /// The left child is folded onto the right child.
    LeftRake,
    /// The right child is folded onto the left child.
    RightRake,
}

impl JoinKind {
    pub fn of(left: &impl Boundary, right: &impl Boundary, parent: &impl Boundary) -> Self {
        if is_left_rake(left, right, parent) {
            JoinKind::LeftRake
        } else if is_right_rake(left, right, parent) {
            JoinKind::RightRake
        } else {
            JoinKind::Compress
        }
    }
}
