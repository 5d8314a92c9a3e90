//! Keyed request coalescing (singleflight).
//!
//! For a given key, at most one task executes the work; concurrent
//! arrivals for the same key wait on a watch channel and share the
//! leader's result. The entry is removed once the leader finishes, so a
//! later call starts a fresh flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

/// The shared outcome of one flight.
pub type FlightResult = Result<(), String>;

enum Role {
    Leader(watch::Sender<Option<FlightResult>>),
    Follower(watch::Receiver<Option<FlightResult>>),
}

/// A group of in-flight computations keyed by string.
#[derive(Default)]
pub struct FlightGroup {
    calls: Mutex<HashMap<String, watch::Receiver<Option<FlightResult>>>>,
}

impl FlightGroup {
    /// Create an empty group.
    pub fn new() -> Arc<Self> {
        Arc::new(FlightGroup::default())
    }

    /// Run `work` for `key`, coalescing with any in-flight execution.
    ///
    /// The leader executes `work` and broadcasts the result; followers
    /// wait and return the shared result without running `work`.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> FlightResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightResult>,
    {
        let role = {
            let mut calls = self.calls.lock().await;
            if let Some(rx) = calls.get(key) {
                Role::Follower(rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                calls.insert(key.to_owned(), rx);
                Role::Leader(tx)
            }
        };

        match role {
            Role::Leader(tx) => {
                let result = work().await;
                let _ = tx.send(Some(result.clone()));
                self.calls.lock().await.remove(key);
                result
            }
            Role::Follower(mut rx) => {
                let outcome = rx.wait_for(|v| v.is_some()).await;
                match outcome {
                    Ok(value) => value.clone().unwrap_or_else(|| {
                        Err("coalesced verification produced no result".to_owned())
                    }),
                    // Leader dropped without sending (panic or cancel).
                    Err(_) => Err("coalesced verification canceled".to_owned()),
                }
            }
        }
    }
}
