//! Change observers notified after every accepted settings update.
//!
//! # Design
//! - Owned by the store instance; there is no process-wide registry.
//! - Delivery is synchronous and in registration order.
//! - A failing observer is logged and skipped; later observers still run.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::model::Configuration;

/// Callback invoked with the configuration that was just accepted.
pub type Observer = dyn Fn(&Configuration) -> anyhow::Result<()> + Send + Sync;

/// Token identifying one registration; used to stop observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl Display for ObserverId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "observer-{}", self.0)
    }
}

/// Append-ordered list of observers.
#[derive(Default)]
pub struct ObserverRegistry {
    entries: Mutex<Vec<(ObserverId, Arc<Observer>)>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` for every future notification. Registering the same
    /// closure twice yields two independent registrations.
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&Configuration) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Arc<Observer> = Arc::new(observer);
        self.entries().push((id, observer));
        id
    }

    /// Remove a registration. Returns `false` when `id` was not registered.
    pub fn stop_observing(&self, id: ObserverId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Invoke every observer with `settings`, in registration order.
    ///
    /// The registry lock is released before delivery, so observers may
    /// register or unregister themselves. Returns the number of observers that
    /// reported an error.
    pub fn notify(&self, settings: &Configuration) -> usize {
        let snapshot: Vec<_> = self
            .entries()
            .iter()
            .map(|(id, observer)| (*id, Arc::clone(observer)))
            .collect();

        let mut failed = 0;
        for (id, observer) in snapshot {
            if let Err(err) = observer(settings) {
                failed += 1;
                let detail = format!("{err:#}");
                warn!(observer = %id, error = %detail, "settings observer failed");
            }
        }
        failed
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(ObserverId, Arc<Observer>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}
