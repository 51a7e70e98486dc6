//! SQLite-backed repository with AES-GCM encryption of baselines and model blobs.
//! Key derived from device-bound secret (in production: Secure Enclave / Keystore / DPAPI).

use super::{BaselineRepository, ModelScope, UserRecord};
use crate::error::{CbhsError, Result};
use crate::features::FeatureVector;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| CbhsError::Crypto(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|_| CbhsError::Crypto("encryption failed".into()))?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| CbhsError::Crypto(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(CbhsError::Crypto("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| CbhsError::Crypto(e.to_string()))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|_| CbhsError::Crypto("decryption failed (wrong key or tampered row)".into()))
}

pub struct SecureStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl SecureStore {
    /// Open or create DB at path. Key is derived from `secret` (in production: device-bound).
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                uid TEXT PRIMARY KEY,
                created_ts INTEGER NOT NULL,
                auths INTEGER NOT NULL DEFAULT 0,
                baseline_enc TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS models (
                scope TEXT PRIMARY KEY,
                blob_enc TEXT NOT NULL,
                updated_ts INTEGER NOT NULL
            );
            "#,
        )?;
        let key = derive_key(secret);
        Ok(Self {
            conn: Mutex::new(conn),
            key,
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BaselineRepository for SecureStore {
    fn insert_user(&self, record: UserRecord) -> Result<bool> {
        let baseline = serde_json::to_vec(&record.baseline)?;
        let enc = encrypt(&self.key, &baseline)?;
        let n = self.conn().execute(
            "INSERT OR IGNORE INTO users (uid, created_ts, auths, baseline_enc) VALUES (?1, ?2, ?3, ?4)",
            params![record.uid, record.created_ts, record.auths as i64, enc],
        )?;
        Ok(n == 1)
    }

    fn get_user(&self, uid: &str) -> Result<Option<UserRecord>> {
        let row = self
            .conn()
            .query_row(
                "SELECT created_ts, auths, baseline_enc FROM users WHERE uid = ?1",
                params![uid],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((created_ts, auths, enc)) = row else {
            return Ok(None);
        };
        let plain = decrypt(&self.key, &enc)?;
        let values: Vec<f64> = serde_json::from_slice(&plain)?;
        Ok(Some(UserRecord {
            uid: uid.to_string(),
            baseline: FeatureVector::try_from_values(values)?,
            created_ts,
            auths: auths.max(0) as u64,
        }))
    }

    fn record_attempts(&self, uid: &str, count: u64) -> Result<Option<u64>> {
        let count = i64::try_from(count)
            .map_err(|_| CbhsError::InvalidInput(format!("attempt count {} too large", count)))?;
        let auths = self
            .conn()
            .query_row(
                "UPDATE users SET auths = auths + ?2 WHERE uid = ?1 RETURNING auths",
                params![uid, count],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(auths.map(|a| a.max(0) as u64))
    }

    fn remove_user(&self, uid: &str) -> Result<bool> {
        let conn = self.conn();
        let n = conn.execute("DELETE FROM users WHERE uid = ?1", params![uid])?;
        conn.execute(
            "DELETE FROM models WHERE scope = ?1",
            params![ModelScope::User(uid.to_string()).key()],
        )?;
        Ok(n == 1)
    }

    fn save_model(&self, scope: &ModelScope, blob: &[u8]) -> Result<()> {
        let enc = encrypt(&self.key, blob)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO models (scope, blob_enc, updated_ts) VALUES (?1, ?2, ?3)",
            params![scope.key(), enc, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn load_model(&self, scope: &ModelScope) -> Result<Option<Vec<u8>>> {
        let enc = self
            .conn()
            .query_row(
                "SELECT blob_enc FROM models WHERE scope = ?1",
                params![scope.key()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        enc.map(|e| decrypt(&self.key, &e)).transpose()
    }
}
