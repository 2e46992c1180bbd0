//! The caller-side "already seen" file: a JSON array of URLs.
//!
//! The engine only ever receives a [`PreviousItemSet`]; reading and rewriting
//! the file happens here, in the binary's output layer.

use crate::models::{Digest, PreviousItemSet};
use crate::utils::truncate_for_log;
use std::collections::BTreeSet;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Read the seen-set file. A missing or unreadable file yields an empty set.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_seen(path: impl AsRef<Path>) -> PreviousItemSet {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Seen-set file not readable; starting empty");
            return PreviousItemSet::new();
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(urls) => {
            info!(count = urls.len(), "Loaded seen set");
            urls.into_iter().collect()
        }
        Err(e) => {
            warn!(
                error = %e,
                preview = %truncate_for_log(&raw, 200),
                "Seen-set file is not a JSON array of strings; starting empty"
            );
            PreviousItemSet::new()
        }
    }
}

/// Rewrite the seen-set file with the previous entries plus this run's URLs.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn save_seen(
    path: impl AsRef<Path>,
    previous: &PreviousItemSet,
    digest: &Digest,
) -> Result<usize, Box<dyn Error>> {
    let union: BTreeSet<&str> = previous
        .iter()
        .map(String::as_str)
        .chain(digest.items.iter().map(|i| i.url.as_str()))
        .collect();
    let json = serde_json::to_string_pretty(&union)?;
    if let Some(dir) = path.as_ref().parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path.as_ref(), json).await?;
    info!(count = union.len(), "Saved seen set");
    Ok(union.len())
}
