use criterion::{criterion_group, criterion_main, Criterion};
use imgcmp::btree::{BPlusTree, BTreeConfig, DuplicatePolicy};

const BRANCHING_FACTOR: usize = 8;

fn open_tree(dir: &tempfile::TempDir, name: &str) -> BPlusTree<BRANCHING_FACTOR> {
    let (tree, _) = BPlusTree::open(
        dir.path().join(name),
        BTreeConfig {
            duplicate_policy: DuplicatePolicy::Bin,
        },
    )
    .unwrap();
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("BPlusTree::insert");

    for item_count in [100, 1_000, 10_000] {
        group.bench_function(format!("{item_count} sequential"), |b| {
            b.iter(|| {
                let dir = tempfile::tempdir().unwrap();
                let mut tree = open_tree(&dir, "t.btree");
                for i in 0..item_count {
                    tree.insert(i as f32, i as u32).unwrap();
                }
            })
        });
    }
}

fn bench_point_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("BPlusTree::search");

    for item_count in [100, 1_000, 10_000] {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = open_tree(&dir, "t.btree");
        for i in 0..item_count {
            tree.insert(i as f32, i as u32).unwrap();
        }

        group.bench_function(format!("{item_count} items"), |b| {
            b.iter(|| tree.search((item_count / 2) as f32).unwrap())
        });
    }
}

criterion_group!(benches, bench_insert, bench_point_search);
criterion_main!(benches);
