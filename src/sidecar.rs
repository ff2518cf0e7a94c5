//! Terminal-stage sidecar sync
//!
//! Shops keep their own JSON copy of each order next to the primary store.
//! When an item reaches the terminal stage, the sidecar's `status` field is
//! updated in place. The sync is best-effort: a missing or unwritable file
//! is reported by the caller, never raised into the transition.

use crate::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Locate the sidecar file for an order
///
/// Probes `<order_id>.json` first, then the legacy `ORDER<order_id>.json`
/// name some shop clients produce.
pub fn sidecar_path(dir: &Path, order_id: &str) -> Option<PathBuf> {
    let direct = dir.join(format!("{}.json", order_id));
    if direct.exists() {
        return Some(direct);
    }
    let legacy = dir.join(format!("ORDER{}.json", order_id));
    if legacy.exists() {
        return Some(legacy);
    }
    None
}

/// Mark an order's sidecar file as completed
///
/// Returns `Ok(true)` when a sidecar was found and updated, `Ok(false)` when
/// no sidecar exists for the order.
pub fn sync_completed(dir: &Path, order_id: &str) -> Result<bool> {
    let path = match sidecar_path(dir, order_id) {
        Some(p) => p,
        None => return Ok(false),
    };

    let content = fs::read_to_string(&path)?;
    let mut value: serde_json::Value = serde_json::from_str(&content)?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("sidecar {} is not a JSON object", path.display()))?;
    object.insert(
        "status".to_string(),
        serde_json::Value::String("Completed".to_string()),
    );

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("sidecar path has no parent directory"))?;
    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(serde_json::to_string_pretty(&value)?.as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(&path)?;

    Ok(true)
}
