//! Encrypted SQLite repository, in-memory repository and model files.

use cbhs_core::config::ModelConfig;
use cbhs_core::storage::{model_file, BaselineRepository, ModelScope, UserRecord};
use cbhs_core::{BaselineModel, CbhsError, FeatureVector, InMemoryRepository, SecureStore, FEATURE_DIM};

fn record(uid: &str) -> UserRecord {
    UserRecord {
        uid: uid.to_string(),
        baseline: FeatureVector::try_from_values((0..FEATURE_DIM).map(|i| i as f64 * 1.5).collect()).unwrap(),
        created_ts: 123,
        auths: 0,
    }
}

fn exercise(repo: &dyn BaselineRepository) {
    assert!(repo.insert_user(record("u1")).unwrap());
    assert!(!repo.insert_user(record("u1")).unwrap());

    let got = repo.get_user("u1").unwrap().unwrap();
    assert_eq!(got, record("u1"));
    assert!(repo.get_user("u2").unwrap().is_none());

    assert_eq!(repo.record_attempts("u1", 1).unwrap(), Some(1));
    assert_eq!(repo.record_attempts("u1", 3).unwrap(), Some(4));
    assert_eq!(repo.record_attempts("u2", 1).unwrap(), None);
    assert_eq!(repo.get_user("u1").unwrap().unwrap().auths, 4);

    let scope = ModelScope::User("u1".into());
    assert!(repo.load_model(&scope).unwrap().is_none());
    repo.save_model(&scope, b"blob-v1").unwrap();
    repo.save_model(&scope, b"blob-v2").unwrap();
    repo.save_model(&ModelScope::Global, b"global").unwrap();
    assert_eq!(repo.load_model(&scope).unwrap().unwrap(), b"blob-v2");

    assert!(repo.remove_user("u1").unwrap());
    assert!(!repo.remove_user("u1").unwrap());
    assert!(repo.get_user("u1").unwrap().is_none());
    assert!(repo.load_model(&scope).unwrap().is_none());
    assert_eq!(repo.load_model(&ModelScope::Global).unwrap().unwrap(), b"global");
}

#[test]
fn in_memory_repository() {
    exercise(&InMemoryRepository::new());
}

#[test]
fn secure_store_repository() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"test-secret").unwrap();
    exercise(&store);
}

#[test]
fn secure_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    {
        let store = SecureStore::open(&path, b"test-secret").unwrap();
        store.insert_user(record("u1")).unwrap();
        store.save_model(&ModelScope::Global, b"model").unwrap();
    }
    let store = SecureStore::open(&path, b"test-secret").unwrap();
    assert_eq!(store.get_user("u1").unwrap().unwrap(), record("u1"));
    assert_eq!(store.load_model(&ModelScope::Global).unwrap().unwrap(), b"model");
}

#[test]
fn secure_store_wrong_secret_cannot_decrypt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    SecureStore::open(&path, b"right").unwrap().insert_user(record("u1")).unwrap();
    let store = SecureStore::open(&path, b"wrong").unwrap();
    assert!(matches!(store.get_user("u1"), Err(CbhsError::Crypto(_))));
}

#[test]
fn scope_keys() {
    assert_eq!(ModelScope::Global.key(), "global");
    assert_eq!(ModelScope::User("x".into()).key(), "user:x");
}

fn small_baseline() -> BaselineModel {
    let corpus: Vec<FeatureVector> = (0..25)
        .map(|i| {
            FeatureVector::try_from_values((0..FEATURE_DIM).map(|j| ((i * 31 + j * 7) % 17) as f64).collect())
                .unwrap()
        })
        .collect();
    BaselineModel::fit(&corpus, &ModelConfig { n_estimators: 20, ..ModelConfig::default() }).unwrap()
}

#[test]
fn model_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");
    assert!(model_file::load(&path).unwrap().is_none());

    let baseline = small_baseline();
    model_file::save(&path, &baseline).unwrap();
    assert_eq!(model_file::load(&path).unwrap().unwrap(), baseline);
}

#[test]
fn model_file_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, b"{\"format_version\":1}").unwrap();
    assert!(matches!(model_file::load(&path), Err(CbhsError::IncompatibleModel(_))));
}
