//! Expiry Sweeper Task
//!
//! Background task that deletes expired time buckets once per second.
//!
//! A ticker advances a logical clock by one second per tick and looks up
//! the bucket for that second; non-empty buckets are handed over a bounded
//! queue to a single drain task that performs the deletion. Since the clock
//! only moves by ticks, a delayed runtime makes the sweeper lag but never
//! skip a second.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::cache::{now_unix, CacheMemory, Store, Value};

/// Pending buckets the drain task may lag behind the ticker.
pub const SWEEP_QUEUE_CAPACITY: usize = 100;

const TICK: Duration = Duration::from_secs(1);

/// Spawns the expiry sweeper for `store`.
///
/// The task exits once the store's shutdown token is cancelled (see
/// [`CacheMemory::stop`]); the returned handle resolves after the drain
/// task has processed every bucket already queued.
pub fn spawn_expiry_sweeper<V: Value>(store: Arc<Store<V>>) -> JoinHandle<()> {
    let token = store.shutdown_token();

    tokio::spawn(async move {
        let (tx, mut rx) = mpsc::channel::<(i64, Vec<String>)>(SWEEP_QUEUE_CAPACITY);

        let drain_store = store.clone();
        let drain = tokio::spawn(async move {
            while let Some((bucket, keys)) = rx.recv().await {
                drain_store.multi_delete_key(&keys, bucket);
            }
        });

        let mut now = now_unix();
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        info!("Starting expiry sweeper at t={}", now);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    now += 1;
                    let Some(keys) = store.expiring_at(now) else {
                        continue;
                    };
                    trace!("Queueing bucket {} with {} keys", now, keys.len());
                    tokio::select! {
                        sent = tx.send((now, keys)) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                        _ = token.cancelled() => break,
                    }
                }
            }
        }

        drop(tx);
        let _ = drain.await;
        debug!("Expiry sweeper stopped");
    })
}
