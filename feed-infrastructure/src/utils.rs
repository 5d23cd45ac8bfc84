use std::path::Path;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::warn;

/// Serializes to a temp file then renames over the target, so a crashed
/// write never leaves a partially written snapshot behind.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Loads a persisted snapshot. A missing or malformed file yields the
/// default value with a diagnostic rather than failing startup.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => {
            warn!("failed to read {}: {}; starting empty", path.display(), err);
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "failed to parse {}: {}; starting empty",
                path.display(),
                err
            );
            T::default()
        }
    }
}
