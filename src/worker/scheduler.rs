//! Generation stream scheduling.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::category::{Category, VanityTarget};
use crate::crypto::KeyGenerator;
use crate::store::Inventory;

use super::search::{StreamState, StreamStats, VanitySearcher};
use super::stop::{stop_channel, StopHandle, StopSignal};

/// How a stream paces itself between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Wait a uniformly random delay in `[min, max]` before every cycle.
    Random { min: Duration, max: Duration },
    /// Start the next cycle as soon as the previous one completes.
    Immediate,
}

impl Pacing {
    /// Draws the delay before the next cycle. Redrawn every cycle.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        match *self {
            Pacing::Immediate => Duration::ZERO,
            Pacing::Random { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = (max.as_millis() as u64).max(min_ms);
                Duration::from_millis(rng.gen_range(min_ms..=max_ms))
            }
        }
    }
}

/// Configuration of one generation stream.
#[derive(Debug, Clone)]
pub struct StreamSpec {
    pub category: Category,
    pub pacing: Pacing,
    /// Delay before the first cycle.
    pub initial_delay: Duration,
}

impl StreamSpec {
    /// The unfiltered stream: every key is kept, one per random interval.
    pub fn unfiltered(min: Duration, max: Duration) -> Self {
        Self {
            category: Category::Unfiltered,
            pacing: Pacing::Random { min, max },
            initial_delay: Duration::ZERO,
        }
    }

    /// A vanity stream searching back to back.
    pub fn vanity(target: VanityTarget, initial_delay: Duration) -> Self {
        Self {
            category: Category::Vanity(target),
            pacing: Pacing::Immediate,
            initial_delay,
        }
    }
}

struct StreamHandle {
    category: Category,
    stats: Arc<StreamStats>,
    task: Option<JoinHandle<()>>,
}

/// Owns the independent generation streams, one per category.
///
/// Each stream is its own tokio task and reschedules itself only after its
/// current cycle completes, so a stream never overlaps with itself. The
/// streams share nothing but the inventory.
pub struct GenerationScheduler {
    streams: Vec<StreamHandle>,
    stop: StopHandle,
    start_time: Instant,
}

impl GenerationScheduler {
    /// Spawns one task per spec. Must be called from within a tokio runtime.
    pub fn start<G>(
        inventory: Arc<dyn Inventory>,
        specs: Vec<StreamSpec>,
        generator: G,
        yield_every: u64,
    ) -> Self
    where
        G: KeyGenerator + Clone + 'static,
    {
        let (stop, signal) = stop_channel();

        let streams = specs
            .into_iter()
            .map(|spec| {
                let stats = Arc::new(StreamStats::new());
                let category = spec.category.clone();
                let stream = Stream {
                    searcher: VanitySearcher::new(
                        spec.category.pattern(),
                        yield_every,
                        stats.clone(),
                    ),
                    spec,
                    generator: generator.clone(),
                    inventory: Arc::clone(&inventory),
                    stats: stats.clone(),
                    stop: signal.clone(),
                    rng: StdRng::from_entropy(),
                };

                StreamHandle {
                    category,
                    stats,
                    task: Some(tokio::spawn(stream.run())),
                }
            })
            .collect();

        Self {
            streams,
            stop,
            start_time: Instant::now(),
        }
    }

    /// Signals all streams to stop.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Stops all streams and waits for them to finish their current step.
    pub async fn join(mut self) {
        self.stop();
        for stream in &mut self.streams {
            if let Some(task) = stream.task.take() {
                if let Err(e) = task.await {
                    error!(category = %stream.category, error = %e, "generation stream panicked");
                }
            }
        }
    }

    /// Returns a handle that stops the scheduler (e.g., from a signal handler).
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns a signal that fires when the scheduler is stopped.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.signal()
    }

    /// Returns true if the scheduler has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Returns each stream's category and statistics.
    pub fn streams(&self) -> impl Iterator<Item = (&Category, &StreamStats)> + '_ {
        self.streams
            .iter()
            .map(|stream| (&stream.category, stream.stats.as_ref()))
    }

    /// Returns the statistics of the stream for the named category.
    pub fn stream_stats(&self, name: &str) -> Option<&StreamStats> {
        self.streams()
            .find(|(category, _)| category.name() == name)
            .map(|(_, stats)| stats)
    }

    /// Returns the total keys generated across all streams.
    pub fn total_keys(&self) -> u64 {
        self.streams().map(|(_, stats)| stats.total_keys()).sum()
    }

    /// Returns the total records appended across all streams.
    pub fn total_appended(&self) -> u64 {
        self.streams().map(|(_, stats)| stats.total_appended()).sum()
    }

    /// Returns the elapsed time since the scheduler started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current generation rate (keys per second).
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_keys() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Drop for GenerationScheduler {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// One self-rescheduling generation loop.
struct Stream<G> {
    spec: StreamSpec,
    searcher: VanitySearcher,
    generator: G,
    inventory: Arc<dyn Inventory>,
    stats: Arc<StreamStats>,
    stop: StopSignal,
    rng: StdRng,
}

impl<G: KeyGenerator> Stream<G> {
    async fn run(mut self) {
        let category = self.spec.category.to_string();
        let pattern = self.searcher.pattern();
        info!(
            category = %category,
            pattern = %pattern.pattern_type(),
            suffix = pattern.pattern(),
            difficulty = %pattern.difficulty_description(),
            "generation stream started"
        );

        let mut running = Self::pause(&self.stop, self.spec.initial_delay).await;
        while running {
            let delay = self.spec.pacing.next_delay(&mut self.rng);
            if delay.is_zero() {
                // Back-to-back cycles still give other tasks a turn.
                tokio::task::yield_now().await;
            } else {
                info!(
                    category = %category,
                    delay_ms = delay.as_millis() as u64,
                    "next keypair scheduled"
                );
                if !Self::pause(&self.stop, delay).await {
                    break;
                }
            }

            running = self.cycle(&category).await;
        }

        self.stats.set_state(StreamState::Idle);
        info!(
            category = %category,
            appended = self.stats.total_appended(),
            failures = self.stats.total_failures(),
            "generation stream stopped"
        );
    }

    /// Waits for `delay`. Returns false if shutdown was requested.
    async fn pause(stop: &StopSignal, delay: Duration) -> bool {
        if stop.is_stopped() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => !stop.is_stopped(),
            _ = stop.clone().stopped() => false,
        }
    }

    /// Runs one Searching -> Appending -> Idle pass.
    ///
    /// Returns false only if shutdown interrupted the search. Once a key is
    /// found the append always runs to completion. Append failures are
    /// logged and the stream carries on.
    async fn cycle(&mut self, category: &str) -> bool {
        if self.stop.is_stopped() {
            return false;
        }

        self.stats.set_state(StreamState::Searching);
        let started = Instant::now();
        let Some(keypair) = self
            .searcher
            .find_matching_until(&mut self.generator, &self.stop)
            .await
        else {
            self.stats.set_state(StreamState::Idle);
            return false;
        };
        debug!(
            category,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );

        self.stats.set_state(StreamState::Appending);
        let public_key = keypair.public_key().to_string();
        match self.inventory.append(&self.spec.category, keypair).await {
            Ok(record) => {
                self.stats.records_appended.fetch_add(1, Ordering::Relaxed);
                info!(category, public_key = %public_key, id = record.id, "keypair stored");
            }
            Err(e) => {
                self.stats.append_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    category,
                    public_key = %public_key,
                    error = %e,
                    "failed to store keypair, rescheduling"
                );
            }
        }

        self.stats.set_state(StreamState::Idle);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::crypto::{Ed25519Generator, Keypair};
    use crate::store::{InventoryRecord, MemoryInventory, StoreError};

    /// Alternates keys ending in `pump` and `bonk`.
    #[derive(Clone, Default)]
    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
    }

    impl KeyGenerator for CountingGenerator {
        fn generate(&mut self) -> Keypair {
            let n = self.calls.fetch_add(1, Ordering::Relaxed);
            let suffix = if n % 2 == 0 { "pump" } else { "bonk" };
            Keypair::new(format!("key{}{}", n, suffix), format!("secret{}", n))
        }
    }

    /// Keeps its counter in a `Cell`: `Send` but not `Sync`.
    #[derive(Clone, Default)]
    struct UnsharedGenerator {
        calls: Cell<u64>,
    }

    impl KeyGenerator for UnsharedGenerator {
        fn generate(&mut self) -> Keypair {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            Keypair::new(format!("key{}pump", n), format!("secret{}", n))
        }
    }

    /// Takes `delay` to complete every append.
    struct SlowInventory {
        inner: MemoryInventory,
        delay: Duration,
    }

    #[async_trait]
    impl Inventory for SlowInventory {
        async fn append(
            &self,
            category: &Category,
            keypair: Keypair,
        ) -> crate::store::Result<InventoryRecord> {
            tokio::time::sleep(self.delay).await;
            self.inner.append(category, keypair).await
        }

        async fn drain(
            &self,
            category: &Category,
            limit: usize,
        ) -> crate::store::Result<Vec<InventoryRecord>> {
            self.inner.drain(category, limit).await
        }

        async fn available(&self, category: &Category) -> crate::store::Result<usize> {
            self.inner.available(category).await
        }
    }

    /// Rejects appends for some categories, or for the first few calls.
    struct FlakyInventory {
        inner: MemoryInventory,
        broken: Vec<String>,
        fail_first: usize,
        attempts: Mutex<HashMap<String, usize>>,
    }

    impl FlakyInventory {
        fn new(broken: &[&str], fail_first: usize) -> Self {
            Self {
                inner: MemoryInventory::new(),
                broken: broken.iter().map(|s| s.to_string()).collect(),
                fail_first,
                attempts: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl Inventory for FlakyInventory {
        async fn append(
            &self,
            category: &Category,
            keypair: Keypair,
        ) -> crate::store::Result<InventoryRecord> {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(category.name().to_string()).or_default();
                *count += 1;
                *count
            };

            if self.broken.iter().any(|b| b == category.name()) || attempt <= self.fail_first {
                return Err(StoreError::Unavailable("store offline".into()));
            }
            self.inner.append(category, keypair).await
        }

        async fn drain(
            &self,
            category: &Category,
            limit: usize,
        ) -> crate::store::Result<Vec<InventoryRecord>> {
            self.inner.drain(category, limit).await
        }

        async fn available(&self, category: &Category) -> crate::store::Result<usize> {
            self.inner.available(category).await
        }
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn pump() -> VanityTarget {
        VanityTarget::new("pumpfun", "pump")
    }

    fn bonk() -> VanityTarget {
        VanityTarget::new("letbonk", "bonk")
    }

    #[test]
    fn test_random_pacing_stays_in_bounds() {
        let pacing = Pacing::Random {
            min: Duration::from_secs(60),
            max: Duration::from_secs(300),
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let delay = pacing.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(60) && delay <= Duration::from_secs(300));
        }
        assert_eq!(
            Pacing::Immediate.next_delay(&mut StepRng::new(0, 1)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_degenerate_interval() {
        let pacing = Pacing::Random {
            min: Duration::from_secs(5),
            max: Duration::from_secs(5),
        };
        assert_eq!(
            pacing.next_delay(&mut StepRng::new(0, 1)),
            Duration::from_secs(5)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfiltered_stream_waits_between_cycles() {
        let inventory = Arc::new(MemoryInventory::new());
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![StreamSpec::unfiltered(
                Duration::from_secs(1),
                Duration::from_secs(1),
            )],
            Ed25519Generator,
            1000,
        );

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(inventory.available(&Category::Unfiltered).await.unwrap(), 3);
        assert_eq!(scheduler.total_keys(), 3);

        scheduler.join().await;
    }

    #[tokio::test]
    async fn test_vanity_streams_store_matching_keys() {
        let inventory = Arc::new(MemoryInventory::new());
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![
                StreamSpec::vanity(pump(), Duration::ZERO),
                StreamSpec::vanity(bonk(), Duration::ZERO),
            ],
            CountingGenerator::default(),
            10,
        );

        wait_until(|| {
            scheduler.streams().all(|(_, stats)| stats.total_appended() >= 3)
        })
        .await;
        scheduler.join().await;

        let pumps = inventory
            .drain(&Category::Vanity(pump()), usize::MAX)
            .await
            .unwrap();
        assert!(pumps.len() >= 3);
        assert!(pumps
            .iter()
            .all(|r| r.keypair.public_key().ends_with("pump")));
    }

    #[tokio::test]
    async fn test_stream_recovers_after_append_failures() {
        let inventory = Arc::new(FlakyInventory::new(&[], 2));
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![StreamSpec::vanity(pump(), Duration::ZERO)],
            CountingGenerator::default(),
            10,
        );

        wait_until(|| {
            scheduler
                .stream_stats("pumpfun")
                .is_some_and(|stats| stats.total_appended() >= 3)
        })
        .await;

        let stats = scheduler.stream_stats("pumpfun").unwrap();
        assert_eq!(stats.total_failures(), 2);
        scheduler.join().await;
    }

    #[tokio::test]
    async fn test_failing_stream_does_not_block_others() {
        let inventory = Arc::new(FlakyInventory::new(&["pumpfun"], 0));
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![
                StreamSpec::vanity(pump(), Duration::ZERO),
                StreamSpec::vanity(bonk(), Duration::ZERO),
            ],
            CountingGenerator::default(),
            10,
        );

        wait_until(|| {
            let pump_failures = scheduler
                .stream_stats("pumpfun")
                .map_or(0, |stats| stats.total_failures());
            let bonk_appended = scheduler
                .stream_stats("letbonk")
                .map_or(0, |stats| stats.total_appended());
            pump_failures >= 3 && bonk_appended >= 3
        })
        .await;

        assert_eq!(scheduler.stream_stats("pumpfun").unwrap().total_appended(), 0);
        scheduler.join().await;
        assert_eq!(
            inventory.available(&Category::Vanity(pump())).await.unwrap(),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_interrupts_waiting_streams() {
        let inventory = Arc::new(MemoryInventory::new());
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![
                StreamSpec::unfiltered(Duration::from_secs(60), Duration::from_secs(300)),
                StreamSpec::vanity(pump(), Duration::from_secs(3600)),
            ],
            Ed25519Generator,
            1000,
        );

        tokio::time::timeout(Duration::from_secs(1), scheduler.join())
            .await
            .expect("streams did not stop");
        assert_eq!(inventory.available(&Category::Unfiltered).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_streams_accept_unshared_generators() {
        let inventory = Arc::new(MemoryInventory::new());
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![StreamSpec::vanity(pump(), Duration::ZERO)],
            UnsharedGenerator::default(),
            10,
        );

        wait_until(|| {
            scheduler
                .stream_stats("pumpfun")
                .is_some_and(|stats| stats.total_appended() >= 2)
        })
        .await;
        scheduler.join().await;

        let stored = inventory
            .drain(&Category::Vanity(pump()), usize::MAX)
            .await
            .unwrap();
        assert!(stored.len() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_append_still_commits() {
        let inventory = Arc::new(SlowInventory {
            inner: MemoryInventory::new(),
            delay: Duration::from_secs(5),
        });
        let scheduler = GenerationScheduler::start(
            inventory.clone(),
            vec![StreamSpec::vanity(pump(), Duration::ZERO)],
            CountingGenerator::default(),
            10,
        );

        wait_until(|| {
            scheduler
                .stream_stats("pumpfun")
                .is_some_and(|stats| stats.state() == StreamState::Appending)
        })
        .await;
        assert_eq!(inventory.available(&Category::Vanity(pump())).await.unwrap(), 0);

        scheduler.stop();
        assert!(scheduler.is_stopped());
        scheduler.join().await;

        let stored = inventory
            .drain(&Category::Vanity(pump()), usize::MAX)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].keypair.public_key().ends_with("pump"));
    }
}
