//! Runtime counters and tick budget monitoring.
//!
//! Counters are plain `AtomicU64`s bumped from the tick and hit paths and read
//! on export. The tick budget history sits behind a `parking_lot::Mutex`
//! because it is only read for dashboards and benches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ArwError, Result};

// ---------------------------------------------------------------------------
// Counters (lock-free)
// ---------------------------------------------------------------------------

/// Atomic counters for high-frequency events.
pub struct ArwCounters {
    /// Tick passes completed.
    pub ticks: AtomicU64,
    /// Actor states created.
    pub actors_tracked: AtomicU64,
    /// Actor states removed on departure.
    pub actors_evicted: AtomicU64,
    /// Per-actor tick passes that hit a host error.
    pub actor_pass_failures: AtomicU64,
    /// Host reads that failed and fell back to cached state.
    pub host_read_failures: AtomicU64,
    /// Hits routed to a weapon or accessory.
    pub hits_routed: AtomicU64,
    /// Deferred actions scheduled.
    pub deferred_scheduled: AtomicU64,
    /// Deferred actions fired against a live target.
    pub deferred_fired: AtomicU64,
    /// Deferred actions dropped because the target was gone.
    pub deferred_dropped: AtomicU64,
    /// Smites landed by deferred strikes.
    pub smites: AtomicU64,
    /// Reversible mutations registered.
    pub mutations_registered: AtomicU64,
    /// Mutations reverted.
    pub mutations_reverted: AtomicU64,
    /// Mutations dropped because the block had changed.
    pub mutations_skipped: AtomicU64,
    /// Mutations dropped because a host call failed.
    pub mutations_failed: AtomicU64,
}

impl ArwCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            actors_tracked: AtomicU64::new(0),
            actors_evicted: AtomicU64::new(0),
            actor_pass_failures: AtomicU64::new(0),
            host_read_failures: AtomicU64::new(0),
            hits_routed: AtomicU64::new(0),
            deferred_scheduled: AtomicU64::new(0),
            deferred_fired: AtomicU64::new(0),
            deferred_dropped: AtomicU64::new(0),
            smites: AtomicU64::new(0),
            mutations_registered: AtomicU64::new(0),
            mutations_reverted: AtomicU64::new(0),
            mutations_skipped: AtomicU64::new(0),
            mutations_failed: AtomicU64::new(0),
        }
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            actors_tracked: self.actors_tracked.load(Ordering::Relaxed),
            actors_evicted: self.actors_evicted.load(Ordering::Relaxed),
            actor_pass_failures: self.actor_pass_failures.load(Ordering::Relaxed),
            host_read_failures: self.host_read_failures.load(Ordering::Relaxed),
            hits_routed: self.hits_routed.load(Ordering::Relaxed),
            deferred_scheduled: self.deferred_scheduled.load(Ordering::Relaxed),
            deferred_fired: self.deferred_fired.load(Ordering::Relaxed),
            deferred_dropped: self.deferred_dropped.load(Ordering::Relaxed),
            smites: self.smites.load(Ordering::Relaxed),
            mutations_registered: self.mutations_registered.load(Ordering::Relaxed),
            mutations_reverted: self.mutations_reverted.load(Ordering::Relaxed),
            mutations_skipped: self.mutations_skipped.load(Ordering::Relaxed),
            mutations_failed: self.mutations_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for ArwCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Tick passes completed.
    pub ticks: u64,
    /// Actor states created.
    pub actors_tracked: u64,
    /// Actor states removed.
    pub actors_evicted: u64,
    /// Failed per-actor passes.
    pub actor_pass_failures: u64,
    /// Failed host reads.
    pub host_read_failures: u64,
    /// Routed hits.
    pub hits_routed: u64,
    /// Scheduled deferred actions.
    pub deferred_scheduled: u64,
    /// Fired deferred actions.
    pub deferred_fired: u64,
    /// Dropped deferred actions.
    pub deferred_dropped: u64,
    /// Landed smites.
    pub smites: u64,
    /// Registered mutations.
    pub mutations_registered: u64,
    /// Reverted mutations.
    pub mutations_reverted: u64,
    /// Skipped mutations.
    pub mutations_skipped: u64,
    /// Failed mutations.
    pub mutations_failed: u64,
}

impl CounterSnapshot {
    fn rows(&self) -> [(&'static str, &'static str, u64); 14] {
        [
            ("ticks", "Tick passes completed", self.ticks),
            ("actors_tracked", "Actor states created", self.actors_tracked),
            ("actors_evicted", "Actor states removed on departure", self.actors_evicted),
            ("actor_pass_failures", "Per-actor passes that hit a host error", self.actor_pass_failures),
            ("host_read_failures", "Host reads that fell back to cached state", self.host_read_failures),
            ("hits_routed", "Hits routed to a weapon or accessory", self.hits_routed),
            ("deferred_scheduled", "Deferred actions scheduled", self.deferred_scheduled),
            ("deferred_fired", "Deferred actions fired", self.deferred_fired),
            ("deferred_dropped", "Deferred actions dropped for a missing target", self.deferred_dropped),
            ("smites", "Smites landed by deferred strikes", self.smites),
            ("mutations_registered", "Reversible mutations registered", self.mutations_registered),
            ("mutations_reverted", "Reversible mutations reverted", self.mutations_reverted),
            ("mutations_skipped", "Mutations skipped because the block changed", self.mutations_skipped),
            ("mutations_failed", "Mutations abandoned after a host error", self.mutations_failed),
        ]
    }

    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        for (name, help, value) in self.rows() {
            out.push_str(&format!(
                "# HELP arw_{name}_total {help}\n# TYPE arw_{name}_total counter\narw_{name}_total {value}\n"
            ));
        }
        out
    }

    /// Format as a JSON object.
    ///
    /// # Errors
    /// Returns `ArwError::InvariantViolation` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ArwError::InvariantViolation(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tick Budget Monitor
// ---------------------------------------------------------------------------

const HISTORY_LEN: usize = 256;

/// Tracks time spent in the ARW tick pass.
///
/// ```rust,no_run
/// # use arw_core::metrics::TickBudgetMonitor;
/// let monitor = TickBudgetMonitor::new(2.0);
/// {
///     let _guard = monitor.begin_tick();
///     // ... tick work ...
/// }
/// assert_eq!(monitor.tick_count(), 1);
/// ```
pub struct TickBudgetMonitor {
    budget_ms: f64,
    history: Mutex<TickHistory>,
}

struct TickHistory {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
    last_over_budget: bool,
}

impl TickBudgetMonitor {
    /// Create a monitor with the given budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(TickHistory {
                timings: vec![0.0; HISTORY_LEN],
                write_idx: 0,
                count: 0,
                last_over_budget: false,
            }),
        }
    }

    /// Begin timing a tick. The guard records the elapsed time on drop.
    pub fn begin_tick(&self) -> TickGuard<'_> {
        TickGuard {
            monitor: self,
            start: Instant::now(),
        }
    }

    /// Record a tick timing manually (milliseconds).
    pub fn record(&self, ms: f64) {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % HISTORY_LEN;
        h.count += 1;
        h.last_over_budget = ms > self.budget_ms;
    }

    /// Last tick's timing in milliseconds.
    #[must_use]
    pub fn last_tick_ms(&self) -> f64 {
        let h = self.history.lock();
        if h.count == 0 {
            return 0.0;
        }
        let idx = (h.write_idx + HISTORY_LEN - 1) % HISTORY_LEN;
        h.timings[idx]
    }

    /// Whether the last tick exceeded the budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.history.lock().last_over_budget
    }

    /// P50, P95, P99 and max over the retained history.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn percentiles(&self) -> TickPercentiles {
        let h = self.history.lock();
        let n = usize::try_from(h.count).unwrap_or(usize::MAX).min(HISTORY_LEN);
        if n == 0 {
            return TickPercentiles::default();
        }

        let mut sorted = h.timings[..n].to_vec();
        sorted.sort_by(f64::total_cmp);

        let over = sorted.iter().filter(|&&t| t > self.budget_ms).count();
        TickPercentiles {
            p50: sorted[n / 2],
            p95: sorted[(n as f64 * 0.95) as usize],
            p99: sorted[(n as f64 * 0.99) as usize],
            max: sorted[n - 1],
            over_budget_ratio: over as f64 / n as f64,
        }
    }

    /// Total ticks recorded.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.history.lock().count
    }

    /// The configured budget in milliseconds.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }
}

/// RAII guard that records elapsed time when dropped.
pub struct TickGuard<'a> {
    monitor: &'a TickBudgetMonitor,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.monitor.record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Percentile statistics for tick timings.
#[derive(Debug, Clone, Default)]
pub struct TickPercentiles {
    /// Median in milliseconds.
    pub p50: f64,
    /// 95th percentile in milliseconds.
    pub p95: f64,
    /// 99th percentile in milliseconds.
    pub p99: f64,
    /// Slowest retained tick.
    pub max: f64,
    /// Share of retained ticks over budget (0.0 to 1.0).
    pub over_budget_ratio: f64,
}

impl TickPercentiles {
    /// Human-readable one-liner.
    #[must_use]
    pub fn summary(&self, budget_ms: f64) -> String {
        format!(
            "P50={:.3}ms  P95={:.3}ms  P99={:.3}ms  Max={:.3}ms  Budget={budget_ms:.1}ms  \
             Over-budget={:.1}%",
            self.p50,
            self.p95,
            self.p99,
            self.max,
            self.over_budget_ratio * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// Whole tick pass.
    pub const TICK: &str = "arw::tick";
    /// One actor's share of the tick pass.
    pub const ACTOR_PASS: &str = "arw::tick::actor";
    /// Deferred action advance.
    pub const DEFERRED: &str = "arw::deferred";
    /// Mutation registry advance.
    pub const MUTATIONS: &str = "arw::mutations";
    /// Hit routing.
    pub const HIT: &str = "arw::hit";
}
