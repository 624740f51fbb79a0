use std::sync::Arc;

use time::Duration;

/// Scheduler-owned view of a task, as seen by the lock.
///
/// The scheduler decides when a task fires and how long a missed occurrence
/// stays runnable (`window`). Both values are read-only here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    name: Arc<str>,
    window: Duration,
}

impl Task {
    pub fn new(name: impl Into<Arc<str>>, window: Duration) -> Self {
        Self {
            name: name.into(),
            window,
        }
    }

    /// Task without a catch-up window.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Duration::ZERO)
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catch-up window. May be zero or negative; both mean "no catch-up".
    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }
}
