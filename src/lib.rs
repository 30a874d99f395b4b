//! Self-adjusting top trees over a dynamic forest.
//!
//! A [`TopTree`] maintains a hierarchical clustering of every tree of a forest. Leaves of the
//! hierarchy are single edges ([`ClusterKind::Base`]); inner clusters either concatenate two path
//! segments that meet in a common vertex ([`ClusterKind::Compress`]) or fold a side branch onto a
//! path point ([`ClusterKind::Rake`]). Each cluster caches a value computed by a user supplied
//! [`ClusterOps`] strategy, which turns path and subtree queries into reading the data of a single
//! cluster after an [`expose`](TopTree::expose).
//!
//! The hierarchy is kept balanced by splaying: each connected component is one binary compress
//! tree whose nodes carry rake trees of the branches hanging off the path. Link, cut and expose
//! all run in amortized `O(log n)` callback invocations.
//!
//! # Example
//!
//! ```
//! use toptree::{BaseForest, ClusterMut, ClusterOps, ClusterRef, TopTree};
//!
//! /// Counts the edges of the exposed path.
//! struct PathLength;
//!
//! impl ClusterOps for PathLength {
//!     type Edge = ();
//!     type Data = usize;
//!
//!     fn init_data(&mut self) -> usize {
//!         0
//!     }
//!
//!     fn create(&mut self, mut cluster: ClusterMut<'_, usize>, _edge: &()) {
//!         *cluster.data_mut() = 1;
//!     }
//!
//!     fn join(
//!         &mut self,
//!         left: ClusterRef<'_, usize>,
//!         right: ClusterRef<'_, usize>,
//!         mut parent: ClusterMut<'_, usize>,
//!     ) {
//!         *parent.data_mut() = match toptree::JoinKind::of(&left, &right, &parent) {
//!             toptree::JoinKind::Compress => *left.data() + *right.data(),
//!             toptree::JoinKind::LeftRake => *right.data(),
//!             toptree::JoinKind::RightRake => *left.data(),
//!         };
//!     }
//! }
//!
//! let mut forest = BaseForest::new();
//! let a = forest.add_vertex();
//! let (b, _) = forest.add_leaf(a, ()).unwrap();
//! let (c, _) = forest.add_leaf(b, ()).unwrap();
//! let (d, _) = forest.add_leaf(b, ()).unwrap();
//!
//! let mut tree = TopTree::from_forest(forest, PathLength).unwrap();
//! let root = tree.expose(a, c).unwrap();
//! assert_eq!(*tree.data(root), 2);
//!
//! tree.cut(b, d).unwrap();
//! let e = tree.add_vertex();
//! tree.link(d, e, ()).unwrap();
//! tree.link(c, d, ()).unwrap();
//! let root = tree.expose(a, e).unwrap();
//! assert_eq!(*tree.data(root), 4);
//! ```

pub mod cluster;
pub mod forest;
pub mod memory;
pub mod ops;
pub mod toptree;

pub use crate::cluster::{
    is_compress, is_left_rake, is_right_rake, Boundary, ClusterKind, ClusterMut, ClusterRef,
    JoinKind,
};
pub use crate::forest::{BaseForest, ForestError};
pub use crate::ops::ClusterOps;
pub use crate::toptree::{Cut, TopTree, TopTreeError};

make_entity! {
    /// Index of a vertex of the base forest.
    pub struct VertexIndex(u32);
    /// Index of an edge of the base forest.
    pub struct EdgeIndex(u32);
    /// Index of a cluster of the top tree.
    pub struct ClusterIndex(u32);
}
