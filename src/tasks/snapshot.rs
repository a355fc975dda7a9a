//! Snapshot Task
//!
//! Background task that periodically writes the cache to the snapshot file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::loading::LoadingCache;
use crate::snapshot;

/// Spawns a task saving `cache` to `path` every `interval_secs` seconds
/// until `token` is cancelled.
pub fn spawn_snapshot_task(
    cache: Arc<LoadingCache>,
    path: PathBuf,
    interval_secs: u64,
    token: CancellationToken,
) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting snapshot task: {} every {} seconds",
            path.display(),
            period.as_secs()
        );
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let entries = cache.get_all();
                    let path = path.clone();
                    let saved = tokio::task::spawn_blocking(move || snapshot::save(&path, &entries)).await;
                    match saved {
                        Ok(Ok(count)) => debug!("Periodic snapshot wrote {} entries", count),
                        Ok(Err(err)) => warn!("Periodic snapshot failed: {}", err),
                        Err(err) => warn!("Periodic snapshot task panicked: {}", err),
                    }
                }
            }
        }

        debug!("Snapshot task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ByteView;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_snapshot_task_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        let cache = Arc::new(
            LoadingCache::builder()
                .retriever_fn(|key| Err(anyhow::anyhow!("{} not exist", key)))
                .build()
                .unwrap(),
        );
        cache.set("Tom", ByteView::from("630"), -1).unwrap();

        let token = CancellationToken::new();
        let handle = spawn_snapshot_task(cache.clone(), path.clone(), 1, token.clone());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        token.cancel();
        handle.await.unwrap();

        let records = snapshot::load(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "Tom");
    }

    #[tokio::test]
    async fn test_snapshot_task_stops_on_cancel() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(
            LoadingCache::builder()
                .retriever_fn(|_| Ok(Vec::new()))
                .build()
                .unwrap(),
        );
        let token = CancellationToken::new();
        let handle = spawn_snapshot_task(cache, dir.path().join("s.txt"), 60, token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("snapshot task should exit after cancel")
            .unwrap();
        assert!(!dir.path().join("s.txt").exists());
    }
}
