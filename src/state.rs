//! @ai:module:intent Shared on/off toggle and active target for escape analysis
//! @ai:module:layer domain
//! @ai:module:public_api AnalysisState
//! @ai:module:stateless false
//! @ai:module:thread_safe true

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct StateInner {
    enabled: bool,
    active_target: Option<PathBuf>,
}

/// @ai:intent Process-wide analysis toggle, shared by the trigger and the listener
///
/// Wrap in an `Arc` and hand the same instance to every component.
#[derive(Debug, Default)]
pub struct AnalysisState {
    inner: Mutex<StateInner>,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn active_target(&self) -> Option<PathBuf> {
        self.lock().active_target.clone()
    }

    /// @ai:intent Flip the enabled flag and return the new value
    /// @ai:post enabled implies active_target == target; disabled implies no active target
    /// @ai:effects state:write
    pub fn toggle(&self, target: Option<&Path>) -> bool {
        let mut inner = self.lock();
        inner.enabled = !inner.enabled;
        inner.active_target = if inner.enabled {
            target.map(Path::to_path_buf)
        } else {
            None
        };
        inner.enabled
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
