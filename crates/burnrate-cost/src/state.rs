// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accumulated spend persisted across restarts.
//!
//! Without billing access, a restarted run would otherwise start from zero
//! and could spend the whole target again. The file holds one JSON object:
//!
//! ```json
//! {"accumulated_nanos": 6000000000, "accumulated_usd": "6.000000000", "updated_at": "..."}
//! ```
//!
//! Updates are read-modify-write under an async mutex, and each write goes to
//! a temporary file in the same directory that is then renamed over the
//! target, so a crash mid-write leaves the previous value intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use burnrate_core::BurnrateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::usd::{Usd, NANOS_PER_USD};

#[derive(Debug, Serialize, Deserialize)]
struct SpendRecord {
    #[serde(default)]
    accumulated_nanos: Option<u64>,
    #[serde(default)]
    accumulated_usd: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl SpendRecord {
    fn new(amount: Usd) -> Self {
        Self {
            accumulated_nanos: Some(amount.nanos()),
            accumulated_usd: Some(format!(
                "{}.{:09}",
                amount.nanos() / NANOS_PER_USD,
                amount.nanos() % NANOS_PER_USD
            )),
            updated_at: Some(Utc::now()),
        }
    }

    // Hand-edited files may carry only the decimal string.
    fn amount(&self) -> Result<Usd, BurnrateError> {
        if let Some(nanos) = self.accumulated_nanos {
            return Ok(Usd::from_nanos(nanos));
        }
        match &self.accumulated_usd {
            Some(text) => text.parse().map_err(|e| BurnrateError::Storage {
                source: Box::new(e),
            }),
            None => Ok(Usd::ZERO),
        }
    }
}

/// File-backed accumulated spend.
#[derive(Debug)]
pub struct SpendStateFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SpendStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accumulated spend, or zero when the file does not exist yet.
    pub async fn load(&self) -> Result<Usd, BurnrateError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Add `delta` to the stored total and return the new total.
    pub async fn add(&self, delta: Usd) -> Result<Usd, BurnrateError> {
        let _guard = self.lock.lock().await;
        let total = self.read_unlocked().await?.saturating_add(delta);
        self.write_unlocked(total).await?;
        debug!(path = %self.path.display(), total = %total, "spend state updated");
        Ok(total)
    }

    /// Overwrite the stored total.
    pub async fn store(&self, total: Usd) -> Result<(), BurnrateError> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(total).await
    }

    async fn read_unlocked(&self) -> Result<Usd, BurnrateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Usd::ZERO),
            Err(e) => {
                return Err(BurnrateError::Storage {
                    source: Box::new(e),
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Usd::ZERO);
        }
        let record: SpendRecord =
            serde_json::from_slice(&bytes).map_err(|e| BurnrateError::Storage {
                source: Box::new(e),
            })?;
        record.amount()
    }

    async fn write_unlocked(&self, total: Usd) -> Result<(), BurnrateError> {
        let json = serde_json::to_vec_pretty(&SpendRecord::new(total)).map_err(|e| {
            BurnrateError::Storage {
                source: Box::new(e),
            }
        })?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| BurnrateError::Internal(format!("state writer task failed: {e}")))?
            .map_err(|e| BurnrateError::Storage {
                source: Box::new(e),
            })
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
