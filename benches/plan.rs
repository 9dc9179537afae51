//! Performance benchmarks for planning and collection path resolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use quaderno::catalog::CollectionPaths;
use quaderno::remote::{MemoryStore, RemoteEntry};
use quaderno::sync::{execute, plan};
use quaderno::types::{CollectionNode, LocalFile, LocalSnapshot, RemoteSnapshot};

/// Library of `n` files spread over 50 folders two levels deep
fn library(n: usize) -> LocalSnapshot {
    let modified = chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap();
    let mut folders = BTreeSet::new();
    let mut files = BTreeMap::new();

    for i in 0..n {
        let top = format!("Topic {}", i % 10);
        let sub = format!("{}/Year {}", top, i % 5);
        let path = format!("{}/paper {} (itemID {}).pdf", sub, i, i);
        folders.insert(top);
        folders.insert(sub);
        files.insert(
            path,
            LocalFile {
                source: PathBuf::from(format!("/zotero/storage/K{:07}/paper.pdf", i)),
                modified,
            },
        );
    }

    LocalSnapshot { folders, files }
}

/// Remote holding every other local file plus as many stale ones
fn half_synced(local: &LocalSnapshot) -> RemoteSnapshot {
    let mut remote = RemoteSnapshot {
        folders: local.folders.clone(),
        ..Default::default()
    };
    for (i, path) in local.files.keys().enumerate() {
        if i % 2 == 0 {
            remote.files.insert(path.clone());
        } else {
            remote.files.insert(format!("Stale/{}", i));
        }
    }
    remote.folders.insert("Stale".to_string());
    remote
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");

    for size in [100, 1_000, 10_000] {
        let local = library(size);
        let remote = half_synced(&local);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| plan(black_box(&local), black_box(&remote)))
        });
    }

    group.finish();
}

fn bench_dry_run(c: &mut Criterion) {
    let local = library(1_000);
    let remote = half_synced(&local);
    let plan = plan(&local, &remote);
    let store = MemoryStore::with_entries(
        remote
            .files
            .iter()
            .map(|path| RemoteEntry::document(format!("Document/Zotero/{}", path))),
    );

    c.bench_function("dry_run_1000", |b| {
        b.iter(|| execute(black_box(&plan), &store, "Document/Zotero", true))
    });
}

fn bench_collection_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_paths");

    for depth in [1, 10, 100] {
        // 1000 collections arranged as chains of `depth`
        let collections: HashMap<i64, CollectionNode> = (0..1000i64)
            .map(|id| {
                let parent = if id % depth == 0 { None } else { Some(id - 1) };
                (
                    id,
                    CollectionNode {
                        id,
                        name: format!("Collection {}", id),
                        parent_id: parent,
                    },
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, _| {
            b.iter(|| CollectionPaths::new(black_box(&collections)).folder_set())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan, bench_dry_run, bench_collection_paths);
criterion_main!(benches);
