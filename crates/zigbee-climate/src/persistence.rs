//! JSON file storage for quirk rules and device fixtures

use crate::error::ClimateError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::fs;

/// Load a list of records from a JSON file.
///
/// A missing or unreadable file yields an empty list.
pub async fn load_list<T: DeserializeOwned>(path: &Path, what: &str) -> Vec<T> {
    match fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str::<Vec<T>>(&contents) {
            Ok(items) => {
                tracing::info!("Loaded {} {} from {:?}", items.len(), what, path);
                items
            }
            Err(e) => {
                tracing::warn!("Failed to parse {} file {:?}: {}", what, path, e);
                Vec::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {} file found at {:?}", what, path);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Failed to read {} file {:?}: {}", what, path, e);
            Vec::new()
        }
    }
}

/// Save a list of records to a JSON file atomically
#[allow(clippy::missing_errors_doc)]
pub async fn save_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), ClimateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(items)?;

    // Write to temp file, then rename
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json).await?;
    fs::rename(&tmp_path, path).await?;

    tracing::debug!("Saved {} records to {:?}", items.len(), path);
    Ok(())
}
