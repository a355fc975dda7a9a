//! Request Coalescing Module
//!
//! Deduplicates concurrent loads for the same key: while one call for a key
//! is outstanding, later callers wait for its result instead of running
//! their own loader.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

// == Flight ==
/// Per-key in-flight load table.
///
/// A completed result is not retained: once the leading call returns, the
/// next caller for the same key starts a fresh load.
pub struct Flight<T> {
    calls: Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
}

enum Role<T> {
    Leader(watch::Sender<Option<T>>),
    Waiter(watch::Receiver<Option<T>>),
}

/// Removes the leader's ticket when the load finishes or is cancelled.
struct Ticket<'a, T> {
    flight: &'a Flight<T>,
    key: &'a str,
}

impl<T> Drop for Ticket<'_, T> {
    fn drop(&mut self) {
        self.flight.calls.lock().remove(self.key);
    }
}

impl<T: Clone> Flight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `loader` for `key` unless a load for it is already running, in
    /// which case the running load's result is returned.
    ///
    /// If the leading call is dropped before it publishes, its waiters run
    /// their own `loader` rather than hang.
    pub async fn fly<F, Fut>(&self, key: &str, loader: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let role = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(rx) => Role::Waiter(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.to_owned(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => {
                let _ticket = Ticket { flight: self, key };
                let result = loader().await;
                // Waiters hold receivers, so a send error only means nobody waited
                let _ = tx.send(Some(result.clone()));
                result
            }
            Role::Waiter(mut rx) => {
                trace!("Joining in-flight load for key '{}'", key);
                let shared = match rx.wait_for(Option::is_some).await {
                    Ok(value) => value.clone(),
                    Err(_) => None,
                };
                match shared {
                    Some(result) => result,
                    None => loader().await,
                }
            }
        }
    }

    /// Number of keys with a load currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<T: Clone> Default for Flight<T> {
    fn default() -> Self {
        Self::new()
    }
}
