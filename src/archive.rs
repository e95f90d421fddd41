//! CSV archiver for the fetched record sequence
//!
//! Writes one row per country, in input order, with a fixed column mapping:
//! `Country Name` ← name, `Capital` ← capital, `Currency` ← currency.
//! Fields are quoted and escaped per RFC 4180. The full buffer is built first
//! and renamed into place, so the caller never observes a partial file.

use crate::config::ArchiveConfig;
use crate::error::{RelayError, Result};
use crate::types::Country;
use std::path::{Path, PathBuf};
use tracing::info;

const HEADER: [&str; 3] = ["Country Name", "Capital", "Currency"];

/// Archiver writing the country sequence to a fixed local CSV path
pub struct CsvArchiver {
    path: PathBuf,
}

impl CsvArchiver {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the full sequence. Atomic from the caller's perspective:
    /// either every row lands or the call fails with a persistence error.
    pub async fn persist(&self, countries: &[Country]) -> Result<()> {
        let mut buf = String::new();
        buf.push_str(&render_row(&HEADER.map(str::to_string)));
        for country in countries {
            buf.push_str(&render_row(&[
                country.name.clone(),
                country.capital.clone().unwrap_or_default(),
                country.currency.clone().unwrap_or_default(),
            ]));
        }

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| RelayError::persistence("archive path has no file name"))?;
        let tmp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        tokio::fs::write(&tmp, buf.as_bytes())
            .await
            .map_err(|e| RelayError::persistence(format!("failed to write {}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            // Best effort; the persistence error is what matters
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RelayError::persistence(format!(
                "failed to move archive into place: {e}"
            )));
        }

        info!(path = %self.path.display(), rows = countries.len(), "archive written");
        Ok(())
    }
}

fn render_row(fields: &[String; 3]) -> String {
    let mut row = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

/// Escape a field value according to RFC 4180
fn escape_field(field: &str) -> String {
    let needs_quoting = field.contains(',')
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r');

    if needs_quoting {
        // Escape quotes by doubling them
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
