//! Process-lifetime memo of production compactions, keyed by group identity.
//!
//! Each key owns a slot that moves from absent, to in-flight while its first caller computes
//! it, to ready. Callers arriving while a slot is in flight await the same computation instead
//! of starting another one, and observe its outcome, success or failure. A failed computation
//! leaves the slot absent so that a later, separate call retries it. Ready slots are never
//! invalidated.

use crate::error::CompactError;
use parking_lot::Mutex;
use std::{collections::HashMap, future::Future};
use tokio::sync::watch;

/// Published once by the caller computing a slot; `None` until then.
type Outcome = Option<Result<Vec<String>, CompactError>>;

#[derive(Debug)]
enum Slot {
    InFlight(watch::Receiver<Outcome>),
    Ready(Vec<String>),
}

enum Claim {
    Lead(watch::Sender<Outcome>),
    Wait(watch::Receiver<Outcome>),
}

#[derive(Debug, Default)]
pub struct GroupCache {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Clears an in-flight slot whose computing caller was dropped before publishing.
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashMap<String, Slot>>,
    key: &'a str,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut slots = self.slots.lock();
            if matches!(slots.get(self.key), Some(Slot::InFlight(_))) {
                tracing::debug!("[GroupCache] abandoned computation for '{}'", self.key);
                slots.remove(self.key);
            }
        }
    }
}

impl GroupCache {
    pub fn new() -> Self {
        GroupCache::default()
    }

    /// The cached references for `key`, if its computation has completed.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready(refs)) => Some(refs.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// True while a computation for `key` is running.
    pub fn is_in_flight(&self, key: &str) -> bool {
        matches!(self.slots.lock().get(key), Some(Slot::InFlight(_)))
    }

    /// Return the value for `key`, running `init` only if no value is cached and no other caller
    /// is already computing it.
    ///
    /// A caller that joins an in-flight computation receives that computation's result,
    /// including its error; it does not run `init` itself. The only exception is a computing
    /// caller that is dropped before finishing, in which case one waiter takes over.
    pub async fn get_or_try_init<F, Fut>(
        &self,
        key: &str,
        init: F,
    ) -> Result<Vec<String>, CompactError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, CompactError>>,
    {
        let sender = loop {
            let claim = {
                let mut slots = self.slots.lock();
                match slots.get(key) {
                    Some(Slot::Ready(refs)) => {
                        tracing::debug!("[GroupCache] hit for '{}'", key);
                        return Ok(refs.clone());
                    }
                    Some(Slot::InFlight(receiver)) => Claim::Wait(receiver.clone()),
                    None => {
                        let (sender, receiver) = watch::channel(None);
                        slots.insert(key.to_string(), Slot::InFlight(receiver));
                        Claim::Lead(sender)
                    }
                }
            };
            match claim {
                Claim::Lead(sender) => break sender,
                Claim::Wait(mut receiver) => {
                    tracing::debug!("[GroupCache] joining in-flight computation for '{}'", key);
                    if let Ok(outcome) = receiver.wait_for(Option::is_some).await {
                        if let Some(result) = &*outcome {
                            return result.clone();
                        }
                    }
                }
            }
        };

        let mut guard = InFlightGuard {
            slots: &self.slots,
            key,
            armed: true,
        };
        let result = init().await;
        {
            let mut slots = self.slots.lock();
            match &result {
                Ok(refs) => {
                    slots.insert(key.to_string(), Slot::Ready(refs.clone()));
                }
                Err(_) => {
                    slots.remove(key);
                }
            }
        }
        guard.armed = false;
        sender.send_replace(Some(result.clone()));
        result
    }

    /// Number of keys with a completed value.
    pub fn ready_len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }
}
