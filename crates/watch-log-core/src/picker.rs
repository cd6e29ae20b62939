//! Randomized picker.
//!
//! `Idle → Shuffling → Settled`. While shuffling, the highlighted index steps
//! through the pool at a slowing pace. When the shuffle window ends, a fresh
//! uniform draw over the current pool decides the pick, so where the
//! highlight happened to stop has no influence on the result.
//!
//! Time comes from an injected [`Clock`] and randomness from an injected
//! [`Rng`], so the state machine can be stepped without real timers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use watch_log_models::{Candidate, MediaKind, WatchedItem};

/// Uniform index in `[0, len)`, `None` for an empty pool
pub fn pick_random<R: Rng>(rng: &mut R, len: usize) -> Option<usize> {
    (len > 0).then(|| rng.random_range(0..len))
}

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Tokio's clock, so paused test time applies
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Pacing of the highlight during a shuffle
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffleSchedule {
    total: Duration,
    /// (fraction of `total` the band ends at, step interval), ascending
    bands: Vec<(f64, Duration)>,
    final_interval: Duration,
}

impl Default for ShuffleSchedule {
    fn default() -> Self {
        Self {
            total: Duration::from_millis(3000),
            bands: vec![
                (0.50, Duration::from_millis(50)),
                (0.70, Duration::from_millis(100)),
                (0.85, Duration::from_millis(200)),
                (0.95, Duration::from_millis(350)),
            ],
            final_interval: Duration::from_millis(600),
        }
    }
}

impl ShuffleSchedule {
    /// Default bands stretched over another total duration
    pub fn with_total(total: Duration) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Settles on the first tick
    pub fn instant() -> Self {
        Self::with_total(Duration::ZERO)
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Step interval after `elapsed` of the shuffle. Never decreases as `elapsed` grows.
    pub fn interval_at(&self, elapsed: Duration) -> Duration {
        if self.total.is_zero() {
            return self.final_interval;
        }
        let progress = elapsed.as_secs_f64() / self.total.as_secs_f64();
        self.bands
            .iter()
            .find(|(until, _)| progress < *until)
            .map(|(_, interval)| *interval)
            .unwrap_or(self.final_interval)
    }
}

/// Where the pool came from; a change of identity restarts the pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Watchlist,
    Trending,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Watchlist => f.write_str("watchlist"),
            PoolKind::Trending => f.write_str("trending"),
        }
    }
}

/// A pool entry from either source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum PoolEntry {
    Watchlist(WatchedItem),
    Trending(Candidate),
}

impl PoolEntry {
    pub fn title(&self) -> &str {
        match self {
            PoolEntry::Watchlist(item) => &item.title,
            PoolEntry::Trending(candidate) => &candidate.title,
        }
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            PoolEntry::Watchlist(item) => Some(item.media_kind),
            PoolEntry::Trending(candidate) => candidate.media_kind,
        }
    }
}

/// Watchlist entries of a snapshot, in snapshot order
pub fn watchlist_pool(items: &[WatchedItem]) -> Vec<PoolEntry> {
    items
        .iter()
        .filter(|item| item.is_watchlist())
        .cloned()
        .map(PoolEntry::Watchlist)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    Shuffling { started: Instant, next_advance: Instant },
    Settled,
}

/// What a call to [`Picker::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PickerEvent {
    /// Nothing to pick from
    Idle,
    /// Shuffling, but no step is due yet
    Waiting,
    /// Highlight moved to this index
    Advanced(usize),
    /// Final pick
    Settled(usize),
}

pub struct Picker<T, C: Clock = MonotonicClock, R: Rng = StdRng> {
    pool: Vec<T>,
    kind: Option<PoolKind>,
    highlighted: Option<usize>,
    state: PickerState,
    generation: u64,
    schedule: ShuffleSchedule,
    clock: C,
    rng: R,
}

impl<T> Picker<T, MonotonicClock, StdRng> {
    /// Tokio clock and an OS-seeded RNG
    pub fn with_schedule(schedule: ShuffleSchedule) -> Self {
        Picker::new(MonotonicClock, StdRng::from_os_rng(), schedule)
    }
}

impl<T, C: Clock, R: Rng> Picker<T, C, R> {
    pub fn new(clock: C, rng: R, schedule: ShuffleSchedule) -> Self {
        Self {
            pool: Vec::new(),
            kind: None,
            highlighted: None,
            state: PickerState::Idle,
            generation: 0,
            schedule,
            clock,
            rng,
        }
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_shuffling(&self) -> bool {
        matches!(self.state, PickerState::Shuffling { .. })
    }

    pub fn pool(&self) -> &[T] {
        &self.pool
    }

    pub fn pool_kind(&self) -> Option<PoolKind> {
        self.kind
    }

    /// Bumped whenever a shuffle starts or the picker is cleared
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Entry under the highlight, shuffling or not
    pub fn current(&self) -> Option<&T> {
        self.highlighted.and_then(|i| self.pool.get(i))
    }

    /// Final pick once settled
    pub fn selected(&self) -> Option<&T> {
        match self.state {
            PickerState::Settled => self.current(),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.state = PickerState::Idle;
        self.highlighted = None;
        self.generation += 1;
    }

    /// Replace the pool.
    ///
    /// An empty pool always goes back to `Idle`. A new pool identity or new
    /// contents restart the pick with a fresh draw, unless a shuffle is running,
    /// in which case the running shuffle simply continues over the new contents.
    pub fn set_pool(&mut self, kind: PoolKind, items: Vec<T>)
    where
        T: PartialEq,
    {
        let identity_changed = self.kind != Some(kind);
        let contents_changed = self.pool != items;
        self.pool = items;
        self.kind = Some(kind);

        if self.pool.is_empty() {
            if self.state != PickerState::Idle {
                debug!(pool = %kind, "Pool emptied, picker idle");
            }
            self.reset();
            return;
        }

        self.highlighted = self.highlighted.map(|i| i.min(self.pool.len() - 1));

        if self.is_shuffling() {
            return;
        }
        if identity_changed || contents_changed {
            debug!(pool = %kind, size = self.pool.len(), "Pool changed, restarting pick");
            self.reset();
            self.start_shuffle();
        } else if self.state == PickerState::Idle {
            self.start_shuffle();
        }
    }

    /// Begin a shuffle. Returns false (and stays idle) on an empty pool.
    pub fn start_shuffle(&mut self) -> bool {
        if self.pool.is_empty() {
            self.reset();
            return false;
        }
        let now = self.clock.now();
        self.generation += 1;
        self.highlighted = Some(self.highlighted.unwrap_or(0).min(self.pool.len() - 1));
        self.state = PickerState::Shuffling {
            started: now,
            next_advance: now + self.schedule.interval_at(Duration::ZERO),
        };
        true
    }

    /// Restart the whole cycle, including a fresh draw
    pub fn respin(&mut self) -> bool {
        self.start_shuffle()
    }

    /// Consumer went away
    pub fn clear(&mut self) {
        self.reset();
    }

    /// When the next tick can change anything, if shuffling
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            PickerState::Shuffling { started, next_advance } => {
                Some(next_advance.min(started + self.schedule.total()))
            }
            _ => None,
        }
    }

    /// Step the state machine against the clock
    pub fn tick(&mut self) -> PickerEvent {
        if self.pool.is_empty() {
            if self.state != PickerState::Idle {
                self.reset();
            }
            return PickerEvent::Idle;
        }

        match self.state {
            PickerState::Idle => PickerEvent::Idle,
            PickerState::Settled => match self.highlighted {
                Some(i) => PickerEvent::Settled(i),
                None => PickerEvent::Idle,
            },
            PickerState::Shuffling { started, next_advance } => {
                let now = self.clock.now();
                let elapsed = now.saturating_duration_since(started);

                if elapsed >= self.schedule.total() {
                    let Some(index) = pick_random(&mut self.rng, self.pool.len()) else {
                        self.reset();
                        return PickerEvent::Idle;
                    };
                    self.highlighted = Some(index);
                    self.state = PickerState::Settled;
                    debug!(index, pool_size = self.pool.len(), "Picker settled");
                    return PickerEvent::Settled(index);
                }

                if now < next_advance {
                    return PickerEvent::Waiting;
                }

                let index = self.highlighted.map_or(0, |i| (i + 1) % self.pool.len());
                self.highlighted = Some(index);
                self.state = PickerState::Shuffling {
                    started,
                    next_advance: now + self.schedule.interval_at(elapsed),
                };
                PickerEvent::Advanced(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_picker(clock: &ManualClock, seed: u64) -> Picker<&'static str, ManualClock, StdRng> {
        Picker::new(clock.clone(), StdRng::seed_from_u64(seed), ShuffleSchedule::default())
    }

    #[test]
    fn test_pick_random_empty_and_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_random(&mut rng, 0), None);
        for _ in 0..100 {
            assert!(pick_random(&mut rng, 3).unwrap() < 3);
        }
    }

    #[test]
    fn test_schedule_is_non_decreasing() {
        let schedule = ShuffleSchedule::default();
        let mut last = Duration::ZERO;
        for ms in (0..=3200).step_by(10) {
            let interval = schedule.interval_at(Duration::from_millis(ms));
            assert!(interval >= last, "interval dropped at {}ms", ms);
            last = interval;
        }
        assert_eq!(schedule.interval_at(Duration::from_millis(0)), Duration::from_millis(50));
        assert_eq!(schedule.interval_at(Duration::from_millis(1600)), Duration::from_millis(100));
        assert_eq!(schedule.interval_at(Duration::from_millis(2200)), Duration::from_millis(200));
        assert_eq!(schedule.interval_at(Duration::from_millis(2700)), Duration::from_millis(350));
        assert_eq!(schedule.interval_at(Duration::from_millis(2900)), Duration::from_millis(600));
    }

    #[test]
    fn test_empty_pool_stays_idle() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 7);
        picker.set_pool(PoolKind::Watchlist, Vec::new());
        assert_eq!(picker.state(), PickerState::Idle);
        assert_eq!(picker.tick(), PickerEvent::Idle);
        assert_eq!(picker.highlighted(), None);
        assert!(!picker.respin());
        assert_eq!(picker.selected(), None);
    }

    #[test]
    fn test_full_cycle() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 7);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b", "c"]);
        assert!(picker.is_shuffling());
        assert_eq!(picker.highlighted(), Some(0));

        assert_eq!(picker.tick(), PickerEvent::Waiting);
        clock.advance(Duration::from_millis(50));
        assert_eq!(picker.tick(), PickerEvent::Advanced(1));
        clock.advance(Duration::from_millis(50));
        assert_eq!(picker.tick(), PickerEvent::Advanced(2));
        clock.advance(Duration::from_millis(50));
        assert_eq!(picker.tick(), PickerEvent::Advanced(0));

        clock.advance(Duration::from_secs(3));
        let PickerEvent::Settled(index) = picker.tick() else {
            panic!("expected settle");
        };
        assert!(index < 3);
        assert_eq!(picker.state(), PickerState::Settled);
        assert_eq!(picker.selected(), picker.pool().get(index));
        assert_eq!(picker.next_deadline(), None);

        // Settled is sticky until a respin
        assert_eq!(picker.tick(), PickerEvent::Settled(index));
        let generation = picker.generation();
        assert!(picker.respin());
        assert!(picker.is_shuffling());
        assert!(picker.generation() > generation);
    }

    #[test]
    fn test_deadline_never_passes_the_window() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 3);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b"]);
        let start = clock.now();
        assert_eq!(picker.next_deadline(), Some(start + Duration::from_millis(50)));

        clock.advance(Duration::from_millis(2950));
        assert!(matches!(picker.tick(), PickerEvent::Advanced(_)));
        assert_eq!(picker.next_deadline(), Some(start + Duration::from_secs(3)));
    }

    #[test]
    fn test_pool_identity_change_restarts_when_settled() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 11);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b"]);
        clock.advance(Duration::from_secs(3));
        assert!(matches!(picker.tick(), PickerEvent::Settled(_)));

        let generation = picker.generation();
        picker.set_pool(PoolKind::Trending, vec!["x", "y", "z"]);
        assert!(picker.is_shuffling());
        assert_eq!(picker.pool_kind(), Some(PoolKind::Trending));
        assert_eq!(picker.highlighted(), Some(0));
        assert!(picker.generation() > generation);
    }

    #[test]
    fn test_pool_change_while_shuffling_continues() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 11);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b", "c", "d"]);
        for _ in 0..3 {
            clock.advance(Duration::from_millis(50));
            picker.tick();
        }
        assert_eq!(picker.highlighted(), Some(3));
        let generation = picker.generation();

        picker.set_pool(PoolKind::Trending, vec!["x", "y"]);
        assert!(picker.is_shuffling());
        assert_eq!(picker.generation(), generation);
        assert_eq!(picker.highlighted(), Some(1));

        clock.advance(Duration::from_secs(3));
        let PickerEvent::Settled(index) = picker.tick() else {
            panic!("expected settle");
        };
        assert!(index < 2);
    }

    #[test]
    fn test_same_pool_settled_keeps_pick() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 5);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b", "c"]);
        clock.advance(Duration::from_secs(3));
        let PickerEvent::Settled(index) = picker.tick() else {
            panic!("expected settle");
        };

        let generation = picker.generation();
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b", "c"]);
        assert_eq!(picker.state(), PickerState::Settled);
        assert_eq!(picker.highlighted(), Some(index));
        assert_eq!(picker.generation(), generation);
    }

    #[test]
    fn test_new_contents_while_settled_draw_again() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 5);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b", "c"]);
        clock.advance(Duration::from_secs(3));
        assert!(matches!(picker.tick(), PickerEvent::Settled(_)));

        let generation = picker.generation();
        picker.set_pool(PoolKind::Watchlist, vec!["x", "y"]);
        assert!(picker.is_shuffling());
        assert_eq!(picker.selected(), None);
        assert!(picker.generation() > generation);

        clock.advance(Duration::from_secs(3));
        let PickerEvent::Settled(index) = picker.tick() else {
            panic!("expected settle");
        };
        assert!(index < 2);
        assert_eq!(picker.selected(), picker.pool().get(index));
    }

    #[test]
    fn test_emptied_pool_goes_idle() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 5);
        picker.set_pool(PoolKind::Watchlist, vec!["a", "b"]);
        assert!(picker.is_shuffling());

        picker.set_pool(PoolKind::Watchlist, Vec::new());
        assert_eq!(picker.state(), PickerState::Idle);
        assert_eq!(picker.highlighted(), None);
        assert_eq!(picker.next_deadline(), None);
    }

    #[test]
    fn test_clear() {
        let clock = ManualClock::new();
        let mut picker = create_picker(&clock, 5);
        picker.set_pool(PoolKind::Trending, vec!["a"]);
        picker.clear();
        assert_eq!(picker.state(), PickerState::Idle);
        assert_eq!(picker.tick(), PickerEvent::Idle);
    }

    #[test]
    fn test_instant_schedule_settles_on_first_tick() {
        let clock = ManualClock::new();
        let mut picker: Picker<u8, _, _> =
            Picker::new(clock.clone(), StdRng::seed_from_u64(9), ShuffleSchedule::instant());
        picker.set_pool(PoolKind::Watchlist, vec![1, 2, 3]);
        assert!(matches!(picker.tick(), PickerEvent::Settled(_)));
    }

    #[test]
    fn test_settle_draws_are_uniform() {
        let clock = ManualClock::new();
        let mut picker: Picker<usize, _, _> =
            Picker::new(clock.clone(), StdRng::seed_from_u64(42), ShuffleSchedule::default());
        let pool_size = 4;
        picker.set_pool(PoolKind::Watchlist, (0..pool_size).collect());

        let draws = 20_000;
        let mut counts = vec![0usize; pool_size];
        for _ in 0..draws {
            picker.respin();
            clock.advance(Duration::from_secs(3));
            match picker.tick() {
                PickerEvent::Settled(index) => counts[index] += 1,
                other => panic!("unexpected {:?}", other),
            }
        }

        let expected = draws as f64 / pool_size as f64;
        for (index, count) in counts.iter().enumerate() {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "index {} drawn {} times", index, count);
        }
    }

    #[test]
    fn test_watchlist_pool_keeps_only_watchlist() {
        use watch_log_models::WatchStatus;
        let items = vec![
            WatchedItem::new("1", "Seen", MediaKind::Movie),
            WatchedItem::new("2", "Planned", MediaKind::Tv).with_status(WatchStatus::Watchlist),
        ];
        let pool = watchlist_pool(&items);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].title(), "Planned");
        assert_eq!(pool[0].media_kind(), Some(MediaKind::Tv));
    }
}
