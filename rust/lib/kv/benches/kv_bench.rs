use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use pubsvc_kv::{KVStore, MemoryKV, RedbStore};

fn bench_redb_set(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    c.bench_function("redb_set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("publication:{}", i);
            store.set(black_box(&key), black_box(b"hello world")).unwrap();
            i += 1;
        });
    });
}

fn bench_redb_get(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    // Pre-populate.
    for i in 0..1000 {
        let key = format!("publication:{:04}", i);
        store.set(&key, b"hello world").unwrap();
    }

    c.bench_function("redb_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("publication:{:04}", i % 1000);
            let _ = store.get(black_box(&key)).unwrap();
            i += 1;
        });
    });
}

fn bench_redb_scan(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    for i in 0..1000 {
        let key = format!("publication:{:04}", i);
        store.set(&key, b"hello world").unwrap();
    }

    c.bench_function("redb_scan_1000", |b| {
        b.iter(|| {
            let results = store.scan(black_box("publication:")).unwrap();
            assert_eq!(results.len(), 1000);
        });
    });
}

fn bench_redb_read_modify_write(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();
    store.set("counter", &0u64.to_be_bytes()).unwrap();

    c.bench_function("redb_txn_increment", |b| {
        b.iter(|| {
            store
                .transaction(&mut |txn| {
                    let raw = txn.get("counter")?.unwrap_or_default();
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(&raw[..8]);
                    let next = u64::from_be_bytes(buf) + 1;
                    txn.set("counter", &next.to_be_bytes())
                })
                .unwrap();
        });
    });
}

fn bench_memory_get(c: &mut Criterion) {
    let kv = MemoryKV::new();
    for i in 0..1000 {
        let key = format!("publication:{:04}", i);
        kv.set(&key, b"hello world").unwrap();
    }

    c.bench_function("memory_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("publication:{:04}", i % 1000);
            let _ = kv.get(black_box(&key)).unwrap();
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_redb_set,
    bench_redb_get,
    bench_redb_scan,
    bench_redb_read_modify_write,
    bench_memory_get,
);
criterion_main!(benches);
