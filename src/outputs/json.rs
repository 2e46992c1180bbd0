//! JSON digest output.
//!
//! Files are organized by date with edition names:
//! ```text
//! json_output_dir/
//! └── 2025-10-18/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//!
//! A second run in the same edition overwrites the earlier file.

use crate::models::Digest;
use chrono::NaiveDate;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// `{json_output_dir}/{date}/{edition}.json`
pub fn digest_path(json_output_dir: &str, date: NaiveDate, edition: &str) -> PathBuf {
    Path::new(json_output_dir)
        .join(date.to_string())
        .join(format!("{edition}.json"))
}

/// Write a [`Digest`] into the dated edition file and return its path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, date = %date, edition = %edition))]
pub async fn write_digest(
    digest: &Digest,
    json_output_dir: &str,
    date: NaiveDate,
    edition: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;
    let path = digest_path(json_output_dir, date, edition);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(
        path = %path.display(),
        items = digest.items.len(),
        "Wrote JSON digest"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsItem, RunStats};

    #[test]
    fn test_digest_path_layout() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 18).unwrap();
        assert_eq!(
            digest_path("/srv/json", date, "evening"),
            PathBuf::from("/srv/json/2025-10-18/evening.json")
        );
    }

    #[tokio::test]
    async fn test_write_digest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 18).unwrap();
        let digest = Digest {
            generated_at: "2025-10-18T12:00:00Z".parse().unwrap(),
            items: vec![NewsItem::new(
                "Ferry strike ends".to_string(),
                "https://example.com/a".to_string(),
                "test",
                "example.com",
            )],
            stats: RunStats::default(),
        };

        let path = write_digest(&digest, root, date, "morning").await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let back: Digest = serde_json::from_str(&written).unwrap();
        assert_eq!(back.items, digest.items);
        assert_eq!(back.generated_at, digest.generated_at);
    }
}
