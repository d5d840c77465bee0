//! Deduplicating work queue shared by crawl workers
//!
//! A [`Frontier`] owns the pending queue and the visited set for one kind of
//! work (pages or feeds). All state sits behind a single lock:
//! - `offer` dedups against both visited and pending URLs
//! - `take` re-checks the visited set and marks the URL visited in the same
//!   critical section, so a URL is dispatched at most once
//! - each dispatched URL is held by a [`Lease`]; dropping the lease
//!   acknowledges the work and may complete the frontier

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use tokio::sync::Notify;
use url::Url;

#[derive(Debug, Default)]
struct FrontierState {
    pending: VecDeque<Url>,
    queued: HashSet<Url>,
    visited: HashSet<Url>,
    in_flight: usize,
    sealed: bool,
    shutdown: bool,
}

impl FrontierState {
    fn is_drained(&self) -> bool {
        self.sealed && self.pending.is_empty() && self.in_flight == 0
    }
}

/// Deduplicating queue of URLs waiting to be processed
#[derive(Debug)]
pub struct Frontier {
    name: &'static str,
    limit: Option<usize>,
    state: Mutex<FrontierState>,
    changed: Notify,
}

/// A URL handed to exactly one worker
///
/// Dropping the lease acknowledges the work. Workers should push everything
/// they discovered before dropping it, so the frontier cannot drain while
/// new URLs are still on their way.
#[derive(Debug)]
pub struct Lease<'a> {
    frontier: &'a Frontier,
    url: Url,
}

impl Lease<'_> {
    /// The dispatched URL
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

impl Frontier {
    /// Creates an unsealed frontier with no dispatch limit
    pub fn new(name: &'static str) -> Self {
        Self::with_limit(name, None)
    }

    /// Creates an unsealed frontier that accepts at most `limit` URLs overall
    pub fn with_limit(name: &'static str, limit: Option<usize>) -> Self {
        Self {
            name,
            limit,
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
        }
    }

    /// Queues a URL unless it was already seen
    ///
    /// Returns true when the URL was queued. Offers are ignored once the
    /// frontier is shut down or has reached its limit.
    pub fn offer(&self, url: Url) -> bool {
        let mut state = self.state.lock();

        if state.shutdown || state.visited.contains(&url) || state.queued.contains(&url) {
            return false;
        }

        if let Some(limit) = self.limit {
            if state.visited.len() + state.pending.len() >= limit {
                tracing::trace!("{} frontier full, dropping {}", self.name, url);
                return false;
            }
        }

        state.queued.insert(url.clone());
        state.pending.push_back(url);
        drop(state);

        self.changed.notify_waiters();
        true
    }

    /// Waits for the next unvisited URL
    ///
    /// Returns `None` once the frontier is drained or shut down.
    pub async fn take(&self) -> Option<Lease<'_>> {
        loop {
            // Registered before inspecting state so no wakeup is lost
            let changed = self.changed.notified();

            {
                let mut state = self.state.lock();
                if state.shutdown {
                    return None;
                }

                while let Some(url) = state.pending.pop_front() {
                    state.queued.remove(&url);
                    if !state.visited.insert(url.clone()) {
                        tracing::debug!("{} frontier skipping visited {}", self.name, url);
                        continue;
                    }
                    state.in_flight += 1;
                    return Some(Lease {
                        frontier: self,
                        url,
                    });
                }

                if state.is_drained() {
                    return None;
                }
            }

            changed.await;
        }
    }

    /// Declares that no URLs will arrive from outside the workers
    pub fn seal(&self) {
        self.state.lock().sealed = true;
        self.changed.notify_waiters();
    }

    /// Stops handing out work and discards pending URLs
    pub fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            state.shutdown = true;
            state.pending.clear();
            state.queued.clear();
        }
        self.changed.notify_waiters();
    }

    /// True when sealed with nothing pending and nothing in flight
    pub fn is_drained(&self) -> bool {
        self.state.lock().is_drained()
    }

    /// True once [`Frontier::shutdown`] has been called
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Resolves once the frontier is drained or shut down
    pub async fn wait_drained(&self) {
        loop {
            let changed = self.changed.notified();
            {
                let state = self.state.lock();
                if state.shutdown || state.is_drained() {
                    return;
                }
            }
            changed.await;
        }
    }

    /// Number of URLs dispatched so far
    pub fn visited_count(&self) -> usize {
        self.state.lock().visited.len()
    }

    /// Number of URLs waiting to be dispatched
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn release(&self) {
        let drained = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.is_drained()
        };

        if drained {
            tracing::debug!("{} frontier drained", self.name);
        }
        self.changed.notify_waiters();
    }
}
