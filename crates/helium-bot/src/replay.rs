//! JSON-lines replay of L2 book snapshots.
//!
//! One snapshot per line:
//! `{"ts": 1700000000000, "bids": [["99.5", "2"]], "asks": [["100.5", "1"]]}`.
//! `ts` (unix ms) is optional; prices and sizes may be strings or numbers.

use std::time::Duration;

use helium_core::{Price, Size};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Full L2 snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    #[serde(default)]
    pub ts: Option<u64>,
    pub bids: Vec<(Price, Size)>,
    pub asks: Vec<(Price, Size)>,
}

impl BookSnapshot {
    pub fn parse(line: &str) -> AppResult<Self> {
        serde_json::from_str(line).map_err(|e| AppError::Replay(e.to_string()))
    }

    /// Snapshot timestamp, or wall-clock time when absent.
    pub fn timestamp_ms(&self) -> u64 {
        self.ts
            .unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0))
    }
}

/// Stream snapshots from `path` into `tx`, one per `interval`.
///
/// Malformed lines are skipped. Returns the number of snapshots sent; the
/// channel closes when this returns.
pub async fn replay_file(
    path: String,
    interval: Duration,
    tx: mpsc::Sender<BookSnapshot>,
) -> AppResult<u64> {
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| AppError::Replay(format!("Failed to open {path}: {e}")))?;
    let mut lines = BufReader::new(file).lines();
    let mut ticker = tokio::time::interval(interval);
    let mut line_no = 0u64;
    let mut sent = 0u64;

    info!(path = %path, interval_ms = interval.as_millis() as u64, "Replay started");

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let snapshot = match BookSnapshot::parse(line) {
            Ok(s) => s,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed snapshot");
                continue;
            }
        };

        ticker.tick().await;
        if tx.send(snapshot).await.is_err() {
            debug!("Snapshot receiver dropped, stopping replay");
            break;
        }
        sent += 1;
    }

    info!(snapshots = sent, lines = line_no, "Replay finished");
    Ok(sent)
}
