use criterion::{criterion_group, criterion_main, Criterion};
use imgcmp::btree::{BPlusTree, BTreeConfig, DuplicatePolicy};
use imgcmp::matcher::search_radius;

const BRANCHING_FACTOR: usize = 8;

fn populated_tree(dir: &tempfile::TempDir, item_count: u32) -> BPlusTree<BRANCHING_FACTOR> {
    let (mut tree, _) = BPlusTree::open(
        dir.path().join("t.btree"),
        BTreeConfig {
            duplicate_policy: DuplicatePolicy::Bin,
        },
    )
    .unwrap();
    for i in 0..item_count {
        tree.insert(i as f32, i).unwrap();
    }
    tree
}

fn bench_range_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("BPlusTree::search_range");

    for item_count in [1_000u32, 10_000, 100_000] {
        let dir = tempfile::tempdir().unwrap();
        let tree = populated_tree(&dir, item_count);
        let delta = search_radius((item_count / 2) as f32, 32.0);

        group.bench_function(format!("{item_count} items, delta={delta:.0}"), |b| {
            b.iter(|| {
                tree.search_range(
                    (item_count / 2) as f32 - delta,
                    (item_count / 2) as f32 + delta,
                )
                .unwrap()
            })
        });
    }
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("BPlusTree::enumerate");

    for item_count in [1_000u32, 10_000] {
        let dir = tempfile::tempdir().unwrap();
        let tree = populated_tree(&dir, item_count);

        group.bench_function(format!("{item_count} items"), |b| {
            b.iter(|| tree.enumerate().unwrap())
        });
    }
}

criterion_group!(benches, bench_range_scan, bench_enumerate);
criterion_main!(benches);
