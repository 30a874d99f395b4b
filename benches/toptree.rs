use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use toptree::{BaseForest, ClusterMut, ClusterOps, ClusterRef, JoinKind, TopTree, VertexIndex};

/// Maximum edge weight on the exposed path.
struct MaxWeight;

impl ClusterOps for MaxWeight {
    type Edge = u64;
    type Data = u64;

    fn init_data(&mut self) -> u64 {
        0
    }

    fn create(&mut self, mut cluster: ClusterMut<'_, u64>, weight: &u64) {
        *cluster.data_mut() = *weight;
    }

    fn join(
        &mut self,
        left: ClusterRef<'_, u64>,
        right: ClusterRef<'_, u64>,
        mut parent: ClusterMut<'_, u64>,
    ) {
        *parent.data_mut() = match JoinKind::of(&left, &right, &parent) {
            JoinKind::Compress => *left.data().max(right.data()),
            JoinKind::LeftRake => *right.data(),
            JoinKind::RightRake => *left.data(),
        };
    }
}

fn make_line_forest(size: usize) -> (BaseForest<u64>, Vec<VertexIndex>) {
    let mut forest = BaseForest::with_capacity(size, size);
    let mut vertices = Vec::with_capacity(size);
    vertices.push(forest.add_vertex());

    for i in 1..size {
        let (vertex, _) = forest.add_leaf(vertices[i - 1], i as u64).unwrap();
        vertices.push(vertex);
    }

    (forest, vertices)
}

/// A deterministic sequence of vertex positions.
fn positions(size: usize, count: usize) -> impl Iterator<Item = usize> {
    let mut state = 0x9e37_79b9_7f4a_7c15_u64;
    (0..count).map(move |_| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % size as u64) as usize
    })
}

fn bench_build(c: &mut Criterion) {
    let mut g = c.benchmark_group("top tree construction");

    for size in [100, 10_000, 100_000] {
        g.bench_with_input(BenchmarkId::new("from_line_forest", size), &size, |b, size| {
            let (forest, _) = make_line_forest(*size);
            b.iter(|| black_box(TopTree::from_forest(forest.clone(), MaxWeight).unwrap()))
        });
        g.bench_with_input(BenchmarkId::new("link_line", size), &size, |b, size| {
            b.iter(|| {
                let mut tree = TopTree::with_capacity(MaxWeight, *size, *size);
                let mut prev = tree.add_vertex();
                for i in 1..*size {
                    let next = tree.add_vertex();
                    tree.link(prev, next, i as u64).unwrap();
                    prev = next;
                }
                black_box(tree)
            })
        });
    }
}

fn bench_expose(c: &mut Criterion) {
    let mut g = c.benchmark_group("top tree expose");

    for size in [100, 10_000, 100_000] {
        g.bench_with_input(BenchmarkId::new("random_expose_line", size), &size, |b, size| {
            let (forest, vertices) = make_line_forest(*size);
            let mut tree = TopTree::from_forest(forest, MaxWeight).unwrap();
            let pairs: Vec<_> = positions(*size, 2_000).collect();
            b.iter(|| {
                for pair in pairs.chunks_exact(2) {
                    if pair[0] != pair[1] {
                        let root = tree.expose(vertices[pair[0]], vertices[pair[1]]).unwrap();
                        black_box(tree.data(root));
                    }
                }
            })
        });
    }
}

fn bench_link_cut(c: &mut Criterion) {
    let mut g = c.benchmark_group("top tree link/cut");

    for size in [100, 10_000, 100_000] {
        g.bench_with_input(BenchmarkId::new("cut_relink_line", size), &size, |b, size| {
            let (forest, vertices) = make_line_forest(*size);
            let mut tree = TopTree::from_forest(forest, MaxWeight).unwrap();
            let cuts: Vec<_> = positions(*size - 1, 1_000).collect();
            b.iter(|| {
                for &i in &cuts {
                    let cut = tree.cut(vertices[i], vertices[i + 1]).unwrap();
                    tree.link(vertices[i + 1], vertices[i], cut.edge).unwrap();
                }
            })
        });
    }
}

criterion_group!(benches, bench_build, bench_expose, bench_link_cut);
criterion_main!(benches);
