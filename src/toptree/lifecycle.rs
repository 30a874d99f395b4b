//! Construction of clusters and the lazy join/split protocol.
use crate::cluster::{Cluster, ClusterKind, ClusterMut, ClusterRef, LEFT, RIGHT};
use crate::ops::ClusterOps;
use crate::{ClusterIndex, EdgeIndex, VertexIndex};

use super::{violation, TopTree};

impl<O: ClusterOps> TopTree<O> {
    /// Creates the base cluster of an edge.
    pub(super) fn construct_base(&mut self, edge: EdgeIndex) -> ClusterIndex {
        let endpoints = self.forest.edge_endpoints(edge).expect("invalid key");
        let data = self.ops.init_data();
        let cluster = self
            .clusters
            .insert(Cluster::new(ClusterKind::Base { edge }, endpoints, data));
        self.forest.set_edge_cluster(edge, Some(cluster));
        self.join_cluster(cluster);
        cluster
    }

    /// Concatenates two path clusters that share exactly one boundary vertex.
    ///
    /// Rake trees left at the common vertex by the initial construction become the fosters of the
    /// new cluster.
    pub(super) fn construct_compress(
        &mut self,
        left: ClusterIndex,
        right: ClusterIndex,
    ) -> ClusterIndex {
        let common = shared_vertex(
            self.clusters[left].boundary,
            self.clusters[right].boundary,
        )
        .unwrap_or_else(|| violation(left, "compressed clusters share no boundary vertex"));
        let fosters = self.forest.take_rake_trees(common);
        let data = self.ops.init_data();

        let cluster = self.clusters.insert(Cluster::new(
            ClusterKind::Compress {
                children: [left, right],
                fosters,
                common,
            },
            [common, common],
            data,
        ));

        for child in [Some(left), Some(right), fosters[LEFT], fosters[RIGHT]]
            .into_iter()
            .flatten()
        {
            self.clusters[child].parent = Some(cluster);
        }

        self.do_join(cluster);
        cluster
    }

    /// Folds `from` onto `to`, both hanging at the same vertex.
    pub(super) fn construct_rake(&mut self, from: ClusterIndex, to: ClusterIndex) -> ClusterIndex {
        let boundary = self.clusters[to].boundary;
        let data = self.ops.init_data();
        let cluster = self.clusters.insert(Cluster::new(
            ClusterKind::Rake { children: [from, to] },
            boundary,
            data,
        ));
        self.clusters[from].parent = Some(cluster);
        self.clusters[to].parent = Some(cluster);
        self.do_join(cluster);
        cluster
    }

    /// Splits a cluster together with all of its joined ancestors, top-down.
    pub(super) fn do_split(&mut self, cluster: ClusterIndex) {
        let mut chain = Vec::new();
        let mut current = Some(cluster);

        while let Some(node) = current {
            if self.clusters[node].is_split {
                break;
            }
            chain.push(node);
            current = self.clusters[node].parent;
        }

        for &node in chain.iter().rev() {
            self.split_cluster(node);
        }
    }

    /// Joins a cluster after joining all of its split descendants.
    pub(super) fn do_join(&mut self, cluster: ClusterIndex) {
        if !self.clusters[cluster].is_split {
            return;
        }

        let mut stack = vec![(cluster, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                self.join_cluster(node);
                continue;
            }

            stack.push((node, true));
            for child in self.clusters[node].descendants().into_iter().flatten() {
                if self.clusters[child].is_split {
                    stack.push((child, false));
                }
            }
        }
    }

    /// Joins every cluster split by the running operation and frees removed clusters.
    pub(super) fn rejoin(&mut self) {
        let mut log = std::mem::take(&mut self.split_log);

        for &cluster in log.iter().rev() {
            if !self.clusters[cluster].deleted {
                self.do_join(cluster);
            }
        }

        log.clear();
        self.split_log = log;

        for cluster in self.garbage.drain(..) {
            self.clusters.remove(cluster);
        }
    }

    /// Marks a cluster as removed. It is freed once the running operation finishes.
    pub(super) fn retire(&mut self, cluster: ClusterIndex) {
        self.remove_root(cluster);
        let node = &mut self.clusters[cluster];
        node.deleted = true;
        node.parent = None;
        self.garbage.push(cluster);
    }

    /// Swaps the orientation of a cluster.
    ///
    /// Only split clusters may be flipped, since the cached data of a joined cluster may depend on
    /// the order of its children.
    pub(super) fn flip(&mut self, cluster: ClusterIndex) {
        let node = &mut self.clusters[cluster];
        debug_assert!(node.is_split, "flipped a joined cluster");

        node.boundary.swap(LEFT, RIGHT);
        if let ClusterKind::Compress {
            children, fosters, ..
        } = &mut node.kind
        {
            children.swap(LEFT, RIGHT);
            fosters.swap(LEFT, RIGHT);
            node.virtual_data.swap(LEFT, RIGHT);
        }
        if let Some(side) = &mut node.rakerized {
            *side = 1 - *side;
        }
    }

    /// Recomputes the boundary and common vertex of a cluster from its children.
    pub(super) fn correct_endpoints(&mut self, cluster: ClusterIndex) {
        match self.clusters[cluster].kind {
            ClusterKind::Base { .. } => {}
            ClusterKind::Compress { children, .. } => {
                let left = self.clusters[children[LEFT]].boundary;
                let right = self.clusters[children[RIGHT]].boundary;
                let Some(common) = shared_vertex(left, right) else {
                    violation(cluster, "compress children share no boundary vertex")
                };

                let node = &mut self.clusters[cluster];
                if let ClusterKind::Compress { common: c, .. } = &mut node.kind {
                    *c = common;
                }
                node.boundary = match node.rakerized {
                    Some(side) => [left, right][side],
                    None => [other_vertex(left, common), other_vertex(right, common)],
                };

                self.forest.set_handle(common, Some(cluster));
            }
            ClusterKind::Rake { children } => {
                self.clusters[cluster].boundary = self.clusters[children[RIGHT]].boundary;
            }
        }
    }

    fn take_data(&mut self, cluster: ClusterIndex) -> O::Data {
        self.clusters[cluster]
            .data
            .take()
            .expect("cluster data is held by a running callback")
    }

    fn put_data(&mut self, cluster: ClusterIndex, data: O::Data) {
        self.clusters[cluster].data = Some(data);
    }

    fn split_cluster(&mut self, cluster: ClusterIndex) {
        let boundary = self.clusters[cluster].boundary;

        match self.clusters[cluster].kind {
            ClusterKind::Base { edge } => {
                let data = self.clusters[cluster].data();
                self.ops.destroy(
                    ClusterRef::new(boundary, data),
                    self.forest.edge_data_mut(edge),
                );
            }
            ClusterKind::Compress {
                children, fosters, ..
            } => {
                let parent = self.take_data(cluster);
                let mut virtuals = std::mem::take(&mut self.clusters[cluster].virtual_data);
                let child_boundary = children.map(|child| self.clusters[child].boundary);
                let mut child_data = children.map(|child| self.take_data(child));

                for side in [LEFT, RIGHT] {
                    if fosters[side].is_none() {
                        virtuals[side] = None;
                    } else if virtuals[side].is_none() {
                        virtuals[side] = Some(self.ops.init_data());
                    }
                }

                {
                    let [left_child, right_child] = &mut child_data;
                    let [left_virtual, right_virtual] = &mut virtuals;
                    let left = ClusterMut::new(
                        child_boundary[LEFT],
                        left_virtual.as_mut().unwrap_or(left_child),
                    );
                    let right = ClusterMut::new(
                        child_boundary[RIGHT],
                        right_virtual.as_mut().unwrap_or(right_child),
                    );
                    self.ops.split(left, right, ClusterRef::new(boundary, &parent));
                }

                for side in [LEFT, RIGHT] {
                    let (Some(foster), Some(virtual_data)) = (fosters[side], &virtuals[side]) else {
                        continue;
                    };
                    let foster_boundary = self.clusters[foster].boundary;
                    let mut foster_data = self.take_data(foster);
                    self.ops.split(
                        ClusterMut::new(foster_boundary, &mut foster_data),
                        ClusterMut::new(child_boundary[side], &mut child_data[side]),
                        ClusterRef::new(child_boundary[side], virtual_data),
                    );
                    self.put_data(foster, foster_data);
                }

                let [left_data, right_data] = child_data;
                self.put_data(children[LEFT], left_data);
                self.put_data(children[RIGHT], right_data);
                self.put_data(cluster, parent);
                self.clusters[cluster].virtual_data = virtuals;
            }
            ClusterKind::Rake { children } => {
                let parent = self.take_data(cluster);
                let [mut from, mut to] = children.map(|child| self.take_data(child));
                self.ops.split(
                    ClusterMut::new(self.clusters[children[LEFT]].boundary, &mut from),
                    ClusterMut::new(self.clusters[children[RIGHT]].boundary, &mut to),
                    ClusterRef::new(boundary, &parent),
                );
                self.put_data(children[LEFT], from);
                self.put_data(children[RIGHT], to);
                self.put_data(cluster, parent);
            }
        }

        self.clusters[cluster].is_split = true;
        self.split_log.push(cluster);
    }

    fn join_cluster(&mut self, cluster: ClusterIndex) {
        match self.clusters[cluster].kind {
            ClusterKind::Base { edge } => {
                let node = &mut self.clusters[cluster];
                self.ops.create(
                    ClusterMut::new(node.boundary, node.data_mut()),
                    self.forest.edge_ref(edge),
                );
            }
            ClusterKind::Compress {
                children, fosters, ..
            } => {
                self.correct_endpoints(cluster);
                let boundary = self.clusters[cluster].boundary;
                let child_boundary = children.map(|child| self.clusters[child].boundary);
                let mut virtuals = std::mem::take(&mut self.clusters[cluster].virtual_data);

                for side in [LEFT, RIGHT] {
                    let Some(foster) = fosters[side] else {
                        virtuals[side] = None;
                        continue;
                    };
                    let mut virtual_data = match virtuals[side].take() {
                        Some(data) => data,
                        None => self.ops.init_data(),
                    };
                    let foster = &self.clusters[foster];
                    let child = &self.clusters[children[side]];
                    self.ops.join(
                        ClusterRef::new(foster.boundary, foster.data()),
                        ClusterRef::new(child.boundary, child.data()),
                        ClusterMut::new(child_boundary[side], &mut virtual_data),
                    );
                    virtuals[side] = Some(virtual_data);
                }

                let mut parent = self.take_data(cluster);
                {
                    let [left, right] = [LEFT, RIGHT].map(|side| match &virtuals[side] {
                        Some(data) => ClusterRef::new(child_boundary[side], data),
                        None => ClusterRef::new(
                            child_boundary[side],
                            self.clusters[children[side]].data(),
                        ),
                    });
                    self.ops.join(left, right, ClusterMut::new(boundary, &mut parent));
                }
                self.put_data(cluster, parent);
                self.clusters[cluster].virtual_data = virtuals;
            }
            ClusterKind::Rake { children } => {
                self.correct_endpoints(cluster);
                let boundary = self.clusters[cluster].boundary;
                let mut parent = self.take_data(cluster);
                {
                    let from = &self.clusters[children[LEFT]];
                    let to = &self.clusters[children[RIGHT]];
                    self.ops.join(
                        ClusterRef::new(from.boundary, from.data()),
                        ClusterRef::new(to.boundary, to.data()),
                        ClusterMut::new(boundary, &mut parent),
                    );
                }
                self.put_data(cluster, parent);
            }
        }

        self.clusters[cluster].is_split = false;
    }
}

/// The vertex shared by two boundaries.
pub(super) fn shared_vertex(a: [VertexIndex; 2], b: [VertexIndex; 2]) -> Option<VertexIndex> {
    a.into_iter().find(|vertex| b.contains(vertex))
}

fn other_vertex(boundary: [VertexIndex; 2], vertex: VertexIndex) -> VertexIndex {
    if boundary[LEFT] == vertex {
        boundary[RIGHT]
    } else {
        boundary[LEFT]
    }
}
