//! Serialized baseline on disk. Callers do this outside any model lock.

use crate::error::Result;
use crate::model::BaselineModel;
use std::path::Path;

/// Write the baseline blob, creating parent directories. Goes through a sibling temp file
/// so a crash never leaves a truncated model behind.
pub fn save(path: &Path, baseline: &BaselineModel) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let blob = baseline.serialize()?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &blob)?;
    std::fs::rename(&tmp, path)?;
    tracing::info!(path = %path.display(), bytes = blob.len(), "baseline saved");
    Ok(())
}

/// `Ok(None)` when no model has been saved yet
pub fn load(path: &Path) -> Result<Option<BaselineModel>> {
    if !path.exists() {
        return Ok(None);
    }
    let blob = std::fs::read(path)?;
    let baseline = BaselineModel::deserialize(&blob)?;
    tracing::info!(path = %path.display(), corpus = baseline.corpus_size(), "baseline loaded");
    Ok(Some(baseline))
}
