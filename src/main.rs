//! CBHS entrypoint: loads or bootstraps the global baseline, then runs one demo round:
//! enroll a user, verify a normal and an anomalous sample scored together.

use cbhs_core::{
    auth::AuthService,
    config::CbhsConfig,
    features::synthetic::{ANOMALOUS_PROFILE, NORMAL_PROFILE},
    logging::{AuthLogEvent, StructuredLogger},
    model::AnomalyModel,
    storage::SecureStore,
    CbhsError,
};
use rand::SeedableRng;
use std::sync::Arc;
use tracing::info;

const DEMO_UID: &str = "demo-user";

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("CBHS_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = CbhsConfig::load(&config_path);

    StructuredLogger::init(&config.log);

    info!(data_dir = ?config.data_dir, "CBHS starting");

    std::fs::create_dir_all(&config.data_dir)?;
    let store_path = config.data_dir.join("store.db");
    let secret = std::env::var("CBHS_DEVICE_SECRET")
        .unwrap_or_else(|_| "device-secret-placeholder".to_string()); // In production: from Secure Enclave / Keystore
    let store = SecureStore::open(&store_path, secret.as_bytes())?;

    let model = Arc::new(AnomalyModel::new(config.model.clone()));
    let service = AuthService::new(Arc::clone(&model), store, config.auth.clone());

    let baseline = service.init_global(&config.resolved_model_path(), &config.synthetic)?;
    info!(
        corpus = baseline.corpus_size(),
        trees = baseline.forest().trees().len(),
        "global baseline ready"
    );

    let mut rng = match config.synthetic.seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_entropy(),
    };

    let enrollment = service.demo_inject(NORMAL_PROFILE, &mut rng)?;
    match service.register(DEMO_UID, enrollment.into_inner(), None) {
        Ok(r) => info!(uid = %r.uid, baseline_dim = r.baseline_dim, "demo user registered"),
        Err(CbhsError::UserExists(_)) => info!(uid = DEMO_UID, "demo user already registered"),
        Err(e) => return Err(e.into()),
    }

    let normal = service.demo_inject(NORMAL_PROFILE, &mut rng)?;
    let anomalous = service.demo_inject(ANOMALOUS_PROFILE, &mut rng)?;
    let mut stdout = std::io::stdout();
    match service.verify_batch(DEMO_UID, vec![normal.into_inner(), anomalous.into_inner()]) {
        Ok(results) => {
            for v in &results {
                StructuredLogger::emit_json(&AuthLogEvent::verdict(v), &mut stdout)?;
            }
        }
        Err(e) => {
            let msg = e.to_string();
            StructuredLogger::emit_json(&AuthLogEvent::failure(Some(DEMO_UID), &msg), &mut stdout)?;
            return Err(e.into());
        }
    }

    let status = service.status(DEMO_UID)?;
    info!(uid = %status.uid, attempts = status.auth_attempts, "CBHS demo round complete");
    Ok(())
}
