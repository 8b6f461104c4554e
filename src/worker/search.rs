//! Vanity suffix search.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use crate::crypto::{KeyGenerator, Keypair};
use crate::matcher::Pattern;

use super::StopSignal;

/// Attempts between cooperative yields.
pub const DEFAULT_YIELD_EVERY: u64 = 1000;

/// Where a stream is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Searching,
    Appending,
}

impl StreamState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => StreamState::Searching,
            2 => StreamState::Appending,
            _ => StreamState::Idle,
        }
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamState::Idle => write!(f, "idle"),
            StreamState::Searching => write!(f, "searching"),
            StreamState::Appending => write!(f, "appending"),
        }
    }
}

/// Statistics for one generation stream.
#[derive(Debug, Default)]
pub struct StreamStats {
    /// Total keys generated
    pub keys_generated: AtomicU64,
    /// Records handed to the inventory
    pub records_appended: AtomicU64,
    /// Appends the inventory rejected
    pub append_failures: AtomicU64,
    state: AtomicU8,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_keys(&self) -> u64 {
        self.keys_generated.load(Ordering::Relaxed)
    }

    pub fn total_appended(&self) -> u64 {
        self.records_appended.load(Ordering::Relaxed)
    }

    pub fn total_failures(&self) -> u64 {
        self.append_failures.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> StreamState {
        StreamState::from_u8(self.state.load(Ordering::Relaxed))
    }

    pub(crate) fn set_state(&self, state: StreamState) {
        let value = match state {
            StreamState::Idle => 0,
            StreamState::Searching => 1,
            StreamState::Appending => 2,
        };
        self.state.store(value, Ordering::Relaxed);
    }
}

/// Repeatedly generates keypairs until one satisfies the pattern.
///
/// The search is CPU-bound and unbounded in time, so it yields to the
/// runtime every `yield_every` attempts. Other tasks on the same worker
/// thread (inventory writes, HTTP requests) are never starved, even on a
/// single-threaded runtime. No lock is held across attempts.
pub struct VanitySearcher {
    pattern: Pattern,
    yield_every: u64,
    stats: Arc<StreamStats>,
}

impl VanitySearcher {
    pub fn new(pattern: Pattern, yield_every: u64, stats: Arc<StreamStats>) -> Self {
        Self {
            pattern,
            yield_every: yield_every.max(1),
            stats,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Searches until a match is found. Never fails.
    pub async fn find_matching<G>(&self, generator: &mut G) -> Keypair
    where
        G: KeyGenerator + ?Sized,
    {
        loop {
            if let Some(keypair) = self.search(generator, None).await {
                return keypair;
            }
        }
    }

    /// Searches until a match is found or `stop` fires.
    ///
    /// Shutdown is only observed at yield points, so the search returns
    /// `None` within `yield_every` attempts of the request.
    pub async fn find_matching_until<G>(
        &self,
        generator: &mut G,
        stop: &StopSignal,
    ) -> Option<Keypair>
    where
        G: KeyGenerator + ?Sized,
    {
        self.search(generator, Some(stop)).await
    }

    async fn search<G>(&self, generator: &mut G, stop: Option<&StopSignal>) -> Option<Keypair>
    where
        G: KeyGenerator + ?Sized,
    {
        // Counted locally and flushed in batches to keep atomics off the hot path.
        let mut since_yield: u64 = 0;

        loop {
            let keypair = generator.generate();
            since_yield += 1;

            if self.pattern.matches(keypair.public_key()).is_match() {
                self.stats
                    .keys_generated
                    .fetch_add(since_yield, Ordering::Relaxed);
                return Some(keypair);
            }

            if since_yield == self.yield_every {
                self.stats
                    .keys_generated
                    .fetch_add(since_yield, Ordering::Relaxed);
                since_yield = 0;

                if stop.is_some_and(StopSignal::is_stopped) {
                    return None;
                }
                tokio::task::yield_now().await;
            }
        }
    }
}
