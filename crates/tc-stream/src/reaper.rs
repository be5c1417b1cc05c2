//! Periodic removal of adaptive directories that have not been used recently.
//!
//! The reaper does not consult the generation registry; a directory whose
//! usage marker is older than the TTL is removed even if an encoder is
//! writing into it.

use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tc_core::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::usage::last_used;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Asset directories examined.
    pub scanned: usize,
    pub removed: usize,
    /// Directories kept: no marker, marker too young, or removal failed.
    pub skipped: usize,
}

/// Remove every asset directory under `hls_root` whose usage marker is
/// strictly older than `ttl`.
pub fn sweep(hls_root: &Path, ttl: Duration) -> Result<SweepReport> {
    sweep_at(hls_root, ttl, SystemTime::now())
}

fn sweep_at(hls_root: &Path, ttl: Duration, now: SystemTime) -> Result<SweepReport> {
    std::fs::create_dir_all(hls_root)?;
    let mut report = SweepReport::default();

    for entry in WalkDir::new(hls_root).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        report.scanned += 1;

        let dir = entry.path();
        let Some(used) = last_used(dir) else {
            report.skipped += 1;
            continue;
        };
        let age = now.duration_since(used).unwrap_or_default();
        if age <= ttl {
            report.skipped += 1;
            continue;
        }

        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                tracing::info!(path = %dir.display(), age_secs = age.as_secs(), "Removed unused stream directory");
                report.removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to remove stream directory");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Run [`sweep`] now and then every `interval` until `cancel` fires.
///
/// Sweeps run one after another on a single task and never overlap.
pub fn spawn_reaper(
    hls_root: impl AsRef<Path>,
    interval: Duration,
    ttl: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let hls_root = hls_root.as_ref().to_path_buf();
    tokio::spawn(async move {
        tracing::info!(
            root = %hls_root.display(),
            interval_secs = interval.as_secs(),
            ttl_secs = ttl.as_secs(),
            "Reaper started"
        );
        loop {
            let root = hls_root.clone();
            match tokio::task::spawn_blocking(move || sweep(&root, ttl)).await {
                Ok(Ok(report)) => {
                    tracing::debug!(
                        scanned = report.scanned,
                        removed = report.removed,
                        skipped = report.skipped,
                        "Sweep finished"
                    );
                }
                Ok(Err(e)) => tracing::error!(error = %e, "Sweep failed"),
                Err(e) => tracing::error!(error = %e, "Sweep task panicked"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Reaper shutting down");
                    break;
                }
            }
        }
    })
}
