//! Shared handle for script bindings.
//!
//! A Bedrock binding registers several independent callbacks (the `system`
//! interval, `entityHurt`, `playerLeave`), each of which needs the same
//! [`ArwRule`]. [`SharedRule`] wraps the rule in an `Arc<Mutex<_>>` so every
//! callback can hold a clone and lock it for the duration of one event.
//!
//! ```text
//! system.runInterval  → SharedRule::tick()
//! entityHurt          → hooks::on_entity_hurt() → SharedRule::dispatch()
//! playerLeave         → SharedRule::departed()
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::info;

use arw_core::config::ArwConfig;
use arw_core::host::Host;
use arw_core::metrics::CounterSnapshot;
use arw_core::types::ActorId;

use crate::combat::HitReport;
use crate::events::{HitEvent, HostEvent};
use crate::rule::{self, ArwRule, TickReport};

/// A cloneable, lockable handle to one [`ArwRule`].
#[derive(Clone, Default)]
pub struct SharedRule {
    inner: Arc<Mutex<ArwRule>>,
}

impl SharedRule {
    /// Wrap an existing rule.
    #[must_use]
    pub fn new(rule: ArwRule) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rule)),
        }
    }

    /// Build a rule from a TOML configuration file.
    ///
    /// # Errors
    /// Fails if the file cannot be read, parsed or validated.
    pub fn from_config_file(path: &Path) -> anyhow::Result<Self> {
        let config = ArwConfig::from_file(path)
            .with_context(|| format!("loading ARW config from {}", path.display()))?;
        let rule = ArwRule::with_config(config).context("building ARW rule")?;
        info!(path = %path.display(), "ARW rule configured");
        Ok(Self::new(rule))
    }

    /// Run one tick pass.
    pub fn tick<H: Host + ?Sized>(&self, host: &mut H) -> TickReport {
        rule::on_tick(&mut self.inner.lock(), host)
    }

    /// Route one hit.
    pub fn hit<H: Host + ?Sized>(&self, host: &mut H, hit: &HitEvent) -> Option<HitReport> {
        rule::on_hit(&mut self.inner.lock(), host, hit)
    }

    /// Forget a departed actor.
    pub fn departed(&self, actor: ActorId) -> bool {
        rule::on_actor_departed(&mut self.inner.lock(), actor)
    }

    /// Dispatch an event produced by [`crate::hooks`].
    pub fn dispatch<H: Host + ?Sized>(&self, host: &mut H, event: HostEvent) {
        rule::process_host_event(&mut self.inner.lock(), host, event);
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        self.inner.lock().counters.snapshot()
    }

    /// Run a closure with exclusive access to the rule.
    pub fn with_rule<T>(&self, f: impl FnOnce(&mut ArwRule) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
