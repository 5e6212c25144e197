use crate::errors::AppError;
use crate::models::AppData;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// Reads the store. A missing file is a fresh start. Entries that do not
/// deserialize are skipped one by one; a file that is not a JSON object at
/// all is copied to `<path>.bak` before empty data is returned, so the next
/// write cannot destroy it.
pub async fn load_data(path: &Path) -> AppData {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            backup_file(path).await;
            return AppData::default();
        }
    };

    let root = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(root)) => root,
        Ok(_) => {
            error!("data file is not a JSON object");
            backup_file(path).await;
            return AppData::default();
        }
        Err(err) => {
            error!("failed to parse data file: {err}");
            backup_file(path).await;
            return AppData::default();
        }
    };

    let data = AppData {
        records: load_entries(root.get("records"), "records"),
        monthly_goals: load_entries(root.get("monthly_goals"), "monthly_goals"),
        yearly_goals: load_entries(root.get("yearly_goals"), "yearly_goals"),
    };
    info!(
        records = data.records.len(),
        monthly_goals = data.monthly_goals.len(),
        yearly_goals = data.yearly_goals.len(),
        "loaded running log"
    );
    data
}

fn load_entries<T: DeserializeOwned>(list: Option<&Value>, field: &str) -> Vec<T> {
    let entries = match list {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            warn!(field, "expected a list in data file, ignoring it");
            return Vec::new();
        }
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| match serde_json::from_value::<T>(entry.clone()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(field, position, %entry, "skipping unreadable entry: {err}");
                None
            }
        })
        .collect()
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

async fn backup_file(path: &Path) {
    let backup = backup_path(path);
    match fs::copy(path, &backup).await {
        Ok(_) => warn!(backup = %backup.display(), "kept a copy of the unreadable data file"),
        Err(err) => error!("failed to back up data file: {err}"),
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
