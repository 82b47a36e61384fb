//! @ai:module:intent Debounce editor activity into a single delayed escape analysis
//! @ai:module:layer application
//! @ai:module:public_api DebounceScheduler, SchedulerState, Listener
//! @ai:module:depends_on trigger, host
//! @ai:module:stateless false
//! @ai:module:thread_safe true

use crate::host::View;
use crate::trigger::Analyzer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// @ai:intent Observable state of the debounce state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Pending,
}

/// The one live timer. `generation` identifies the newest timer; a task whose
/// generation no longer matches has been superseded and must not fire.
#[derive(Default)]
struct TimerSlot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// @ai:intent Coalesces activity signals, running analysis once per quiet period
pub struct DebounceScheduler {
    analyzer: Arc<Analyzer>,
    quiet_period: Duration,
    runtime: Handle,
    slot: Arc<Mutex<TimerSlot>>,
}

impl DebounceScheduler {
    /// @ai:intent Create a scheduler whose timers run on `runtime`
    /// @ai:effects pure
    pub fn new(analyzer: Arc<Analyzer>, quiet_period: Duration, runtime: Handle) -> Self {
        Self {
            analyzer,
            quiet_period,
            runtime,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// @ai:intent Report whether a timer is waiting to fire
    pub fn state(&self) -> SchedulerState {
        match lock(&self.slot).handle {
            Some(_) => SchedulerState::Pending,
            None => SchedulerState::Idle,
        }
    }

    /// @ai:intent Replace any pending timer with a fresh one for `view`
    /// @ai:post exactly one timer is live
    /// @ai:effects state:write, time
    pub fn schedule(&self, view: Arc<dyn View>) {
        let mut slot = lock(&self.slot);
        self.replace_timer(&mut slot, view);
    }

    fn replace_timer(&self, slot: &mut TimerSlot, view: Arc<dyn View>) {
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }

        slot.generation += 1;
        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let analyzer = Arc::clone(&self.analyzer);
        let quiet_period = self.quiet_period;

        slot.handle = Some(self.runtime.spawn(async move {
            tokio::time::sleep(quiet_period).await;

            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.handle = None;
            }

            if !analyzer.state().is_enabled() {
                tracing::debug!("Analysis disabled while a timer was pending");
                return;
            }

            let result =
                tokio::task::spawn_blocking(move || analyzer.run_analysis(view.as_ref())).await;

            if let Err(e) = result {
                tracing::warn!("Debounced escape analysis failed: {}", e);
            }
        }));
    }

    /// @ai:intent Drop the pending timer, if any
    /// @ai:effects state:write
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;

        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(slot: &Mutex<TimerSlot>) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// @ai:intent Routes editor focus and modification events into the scheduler
pub struct Listener {
    analyzer: Arc<Analyzer>,
    scheduler: DebounceScheduler,
}

impl Listener {
    /// @ai:effects pure
    pub fn new(analyzer: Arc<Analyzer>, quiet_period: Duration, runtime: Handle) -> Self {
        let scheduler = DebounceScheduler::new(Arc::clone(&analyzer), quiet_period, runtime);
        Self {
            analyzer,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &DebounceScheduler {
        &self.scheduler
    }

    /// @ai:intent Handle a view gaining focus
    /// @ai:effects state:write, view:write
    pub fn on_activated(&self, view: Arc<dyn View>) {
        self.on_activity(view);
    }

    /// @ai:intent Handle a view's content changing
    /// @ai:effects state:write, view:write
    pub fn on_modified(&self, view: Arc<dyn View>) {
        self.on_activity(view);
    }

    fn on_activity(&self, view: Arc<dyn View>) {
        if self.analyzer.state().is_enabled() {
            self.scheduler.schedule(view);
        } else {
            self.analyzer.clear(view.as_ref());
        }
    }
}
