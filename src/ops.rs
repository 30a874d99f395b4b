//! The aggregation strategy plugged into a [`TopTree`](crate::TopTree).
use crate::cluster::{ClusterMut, ClusterRef};

/// Callbacks that compute and maintain the data cached in every cluster.
///
/// The engine calls these whenever the hierarchy changes. A cluster's data is only valid while the
/// cluster is joined: before a cluster's children are touched the engine *splits* it, giving the
/// strategy a chance to push lazily stored updates down, and afterwards it *joins* it again from
/// its children.
///
/// `join` and `split` serve every binary shape: compress clusters, rake clusters, the virtual rake
/// nodes that fold the branches of a compress cluster onto its path children, and exposed
/// clusters. Use [`JoinKind::of`](crate::JoinKind::of) or the `is_*_rake` predicates on the
/// boundary vertices to tell the shapes apart.
///
/// # Example
///
/// Maintaining the maximum edge weight on the exposed path:
///
/// ```
/// use toptree::{ClusterMut, ClusterOps, ClusterRef, JoinKind};
///
/// struct MaxWeight;
///
/// impl ClusterOps for MaxWeight {
///     type Edge = i64;
///     type Data = i64;
///
///     fn init_data(&mut self) -> i64 {
///         i64::MIN
///     }
///
///     fn create(&mut self, mut cluster: ClusterMut<'_, i64>, weight: &i64) {
///         *cluster.data_mut() = *weight;
///     }
///
///     fn join(
///         &mut self,
///         left: ClusterRef<'_, i64>,
///         right: ClusterRef<'_, i64>,
///         mut parent: ClusterMut<'_, i64>,
///     ) {
///         *parent.data_mut() = match JoinKind::of(&left, &right, &parent) {
///             JoinKind::Compress => *left.data().max(right.data()),
///             JoinKind::LeftRake => *right.data(),
///             JoinKind::RightRake => *left.data(),
///         };
///     }
/// }
/// ```
pub trait ClusterOps {
    /// Payload stored on every edge of the base forest.
    type Edge;

    /// Data cached in every cluster.
    type Data;

    /// Creates the data of a cluster that has not been joined yet.
    fn init_data(&mut self) -> Self::Data;

    /// Initializes the data of a base cluster from its edge.
    fn create(&mut self, cluster: ClusterMut<'_, Self::Data>, edge: &Self::Edge);

    /// Called before a base cluster is split or removed.
    ///
    /// Lets the strategy write lazily accumulated state back into the edge.
    fn destroy(&mut self, _cluster: ClusterRef<'_, Self::Data>, _edge: &mut Self::Edge) {}

    /// Computes the data of `parent` from its two children.
    ///
    /// The previous contents of the parent's data are stale and must be overwritten.
    fn join(
        &mut self,
        left: ClusterRef<'_, Self::Data>,
        right: ClusterRef<'_, Self::Data>,
        parent: ClusterMut<'_, Self::Data>,
    );

    /// Pushes updates stored on `parent` down into its children.
    fn split(
        &mut self,
        _left: ClusterMut<'_, Self::Data>,
        _right: ClusterMut<'_, Self::Data>,
        _parent: ClusterRef<'_, Self::Data>,
    ) {
    }
}
