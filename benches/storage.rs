//! Secure storage benchmark: encrypted user records and model blobs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cbhs_core::storage::{BaselineRepository, ModelScope, UserRecord};
use cbhs_core::{FeatureVector, SecureStore, FEATURE_DIM};
use tempfile::tempdir;

fn record(uid: String) -> UserRecord {
    UserRecord {
        uid,
        baseline: FeatureVector::try_from_values(vec![0.5; FEATURE_DIM]).unwrap(),
        created_ts: 0,
        auths: 0,
    }
}

fn bench_insert_user(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"bench-secret").unwrap();
    let mut i = 0u64;

    c.bench_function("storage_insert_user", |b| {
        b.iter(|| {
            i += 1;
            black_box(store.insert_user(record(format!("user-{}", i)))).unwrap()
        })
    });
}

fn bench_read_and_attempt(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"bench-secret").unwrap();
    store.insert_user(record("user-1".to_string())).unwrap();

    c.bench_function("storage_get_user", |b| {
        b.iter(|| black_box(store.get_user("user-1")).unwrap())
    });
    c.bench_function("storage_record_attempt", |b| {
        b.iter(|| black_box(store.record_attempts("user-1", 1)).unwrap())
    });
}

fn bench_model_blob(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"bench-secret").unwrap();
    let blob = vec![7u8; 256 * 1024];
    store.save_model(&ModelScope::Global, &blob).unwrap();

    c.bench_function("storage_load_model_256k", |b| {
        b.iter(|| black_box(store.load_model(&ModelScope::Global)).unwrap())
    });
}

criterion_group!(benches, bench_insert_user, bench_read_and_attempt, bench_model_blob);
criterion_main!(benches);
