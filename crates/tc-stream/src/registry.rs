//! In-flight generation registry.
//!
//! At most one encoder run per [`GenerationKey`] exists at a time. The first
//! caller for a key becomes the leader and holds a [`LeaderGuard`]; every
//! other caller receives the leader's [`GenerationHandle`] and waits on it.
//!
//! Entries only live while a generation is running. The leader removes its
//! entry before publishing the terminal state, so waiters that wake up and
//! retry find the slot vacant. A leader that is cancelled, killed, or dropped
//! publishes [`GenerationState::Abandoned`] and waiters race to take over.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tc_core::{Error, GenerationKey, Result};
use tokio::sync::watch;

/// Observable state of one generation.
#[derive(Debug, Clone)]
pub enum GenerationState {
    /// Encoder running; `ticks` counts progress reports so far.
    Running { ticks: u64 },
    Finished,
    /// Hard failure, delivered to every waiter.
    Failed(Arc<Error>),
    /// Leader gave up without a verdict (cancelled or killed).
    Abandoned,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running { .. })
    }
}

/// Terminal outcome as seen by a waiter.
#[derive(Debug)]
pub enum Outcome {
    Finished,
    Failed(Error),
    Abandoned,
}

/// Shared view of an in-flight generation.
#[derive(Debug, Clone)]
pub struct GenerationHandle {
    key: GenerationKey,
    tx: Arc<watch::Sender<GenerationState>>,
}

impl GenerationHandle {
    fn new(key: GenerationKey) -> Self {
        let (tx, _rx) = watch::channel(GenerationState::Running { ticks: 0 });
        Self {
            key,
            tx: Arc::new(tx),
        }
    }

    pub fn key(&self) -> GenerationKey {
        self.key
    }

    /// Receiver that observes progress ticks and the terminal state.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> GenerationState {
        self.tx.borrow().clone()
    }

    /// Publish one progress report.
    pub fn tick(&self) {
        self.tx.send_modify(|state| {
            if let GenerationState::Running { ticks } = state {
                *ticks += 1;
            }
        });
    }

    /// Wait until the generation reaches a terminal state.
    pub async fn wait(&self) -> Outcome {
        let mut rx = self.subscribe();
        loop {
            if let Some(outcome) = terminal_outcome(&rx.borrow_and_update()) {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return Outcome::Abandoned;
            }
        }
    }

    fn publish(&self, state: GenerationState) {
        self.tx.send_replace(state);
    }
}

/// Map a state to a waiter outcome, or `None` while still running.
pub fn terminal_outcome(state: &GenerationState) -> Option<Outcome> {
    match state {
        GenerationState::Running { .. } => None,
        GenerationState::Finished => Some(Outcome::Finished),
        GenerationState::Failed(e) => Some(Outcome::Failed(e.duplicate())),
        GenerationState::Abandoned => Some(Outcome::Abandoned),
    }
}

/// Result of trying to claim a key.
pub enum Slot {
    Leader(LeaderGuard),
    Follower(GenerationHandle),
}

/// Exclusive right to generate one key.
///
/// Dropping the guard without calling [`LeaderGuard::finish`] releases the
/// slot as abandoned.
pub struct LeaderGuard {
    inflight: Arc<DashMap<GenerationKey, GenerationHandle>>,
    handle: GenerationHandle,
    done: bool,
}

impl LeaderGuard {
    pub fn handle(&self) -> &GenerationHandle {
        &self.handle
    }

    /// Release the slot and publish the outcome of `result`.
    pub fn finish(mut self, result: &Result<()>) {
        let state = match result {
            Ok(()) => GenerationState::Finished,
            Err(e) if e.is_soft() => GenerationState::Abandoned,
            Err(e) => GenerationState::Failed(Arc::new(e.duplicate())),
        };
        self.release(state);
    }

    fn release(&mut self, state: GenerationState) {
        if self.done {
            return;
        }
        self.done = true;
        let key = self.handle.key;
        self.inflight
            .remove_if(&key, |_, h| Arc::ptr_eq(&h.tx, &self.handle.tx));
        self.handle.publish(state);
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(key = %self.handle.key, "Generation leader dropped");
            self.release(GenerationState::Abandoned);
        }
    }
}

/// Process-wide registry of in-flight generations.
#[derive(Clone, Default)]
pub struct GenerationRegistry {
    inflight: Arc<DashMap<GenerationKey, GenerationHandle>>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or join the generation already running for it.
    pub fn acquire(&self, key: GenerationKey) -> Slot {
        match self.inflight.entry(key) {
            Entry::Occupied(e) => Slot::Follower(e.get().clone()),
            Entry::Vacant(e) => {
                let handle = GenerationHandle::new(key);
                e.insert(handle.clone());
                Slot::Leader(LeaderGuard {
                    inflight: self.inflight.clone(),
                    handle,
                    done: false,
                })
            }
        }
    }

    /// Handle of the generation running for `key`, if any.
    pub fn get(&self, key: &GenerationKey) -> Option<GenerationHandle> {
        self.inflight.get(key).map(|e| e.value().clone())
    }

    pub fn contains(&self, key: &GenerationKey) -> bool {
        self.inflight.contains_key(key)
    }

    /// Number of generations currently running.
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }

    /// Run `work` as the only generation for `key`.
    ///
    /// Concurrent callers wait for the leader and share its outcome. If the
    /// leader abandons the key, a waiter takes over and runs `work` itself.
    pub async fn run_exclusive<F, Fut>(&self, key: GenerationKey, mut work: F) -> Result<()>
    where
        F: FnMut(GenerationHandle) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        loop {
            match self.acquire(key) {
                Slot::Leader(guard) => {
                    let result = work(guard.handle().clone()).await;
                    guard.finish(&result);
                    return result;
                }
                Slot::Follower(handle) => match handle.wait().await {
                    Outcome::Finished => return Ok(()),
                    Outcome::Failed(e) => return Err(e),
                    Outcome::Abandoned => {
                        tracing::debug!(key = %key, "Leader abandoned generation; retrying");
                        continue;
                    }
                },
            }
        }
    }
}
