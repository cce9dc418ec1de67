//! Settings store mediating every read and write of the live configuration.
//!
//! # Design
//! - One live [`Configuration`] per store, shared through
//!   [`SharedConfiguration`] and replaced in place after each round-trip.
//! - `load`/`save` run one at a time; the in-flight guard is held across the
//!   network call so a save and a load can not interleave.
//! - State replacement and observer delivery happen without an await point
//!   in between.
//! - Failures leave state untouched and never reach observers.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::{ClientConfig, ConfigTransport, RemoteConfigClient};
use crate::error::{ConfigError, ConfigResult};
use crate::model::Configuration;
use crate::observer::{ObserverId, ObserverRegistry};

/// Cloneable handle onto the live configuration of a store.
///
/// Every clone observes updates made by the store without resubscribing.
#[derive(Debug, Clone, Default)]
pub struct SharedConfiguration {
    inner: Arc<RwLock<Configuration>>,
}

impl SharedConfiguration {
    /// Wrap `configuration` in a new shared handle.
    #[must_use]
    pub fn new(configuration: Configuration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(configuration)),
        }
    }

    /// Copy of the current value.
    #[must_use]
    pub fn snapshot(&self) -> Configuration {
        self.read(Clone::clone)
    }

    /// Run `f` against the current value.
    pub fn read<R>(&self, f: impl FnOnce(&Configuration) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Mutate the current value in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    fn replace(&self, next: Configuration) -> Configuration {
        self.update(|current| {
            current.replace_sections(next);
            current.clone()
        })
    }
}

/// Owner of the canonical configuration and its observers.
pub struct SettingsStore<T = RemoteConfigClient> {
    transport: T,
    state: SharedConfiguration,
    observers: ObserverRegistry,
    in_flight: Mutex<()>,
}

impl SettingsStore<RemoteConfigClient> {
    /// Store backed by a [`RemoteConfigClient`] built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or `seed` does not fit
    /// the configuration shape.
    pub fn connect(config: &ClientConfig, seed: &Value) -> ConfigResult<Self> {
        Self::new(RemoteConfigClient::new(config)?, seed)
    }
}

impl<T: ConfigTransport> SettingsStore<T> {
    /// Create a store whose initial value is `seed` with every missing section
    /// filled from its baseline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] when `seed` does not fit the
    /// configuration shape.
    pub fn new(transport: T, seed: &Value) -> ConfigResult<Self> {
        let configuration = Configuration::from_seed(seed).map_err(|source| {
            ConfigError::Decode {
                operation: "seed",
                source,
            }
        })?;
        Ok(Self::with_configuration(transport, configuration))
    }

    /// Create a store around an already typed configuration.
    pub fn with_configuration(transport: T, configuration: Configuration) -> Self {
        Self {
            transport,
            state: SharedConfiguration::new(configuration),
            observers: ObserverRegistry::new(),
            in_flight: Mutex::new(()),
        }
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn configuration(&self) -> Configuration {
        self.state.snapshot()
    }

    /// Live handle onto the configuration.
    #[must_use]
    pub fn shared(&self) -> SharedConfiguration {
        self.state.clone()
    }

    /// Edit the configuration in place ahead of a [`save`](Self::save).
    /// Observers are not notified.
    pub fn update<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        self.state.update(f)
    }

    /// Registered observers.
    #[must_use]
    pub const fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    /// Register `observer` for every future successful `load`/`save`.
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&Configuration) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.observers.observe(observer)
    }

    /// Remove a registration; unknown ids are ignored.
    pub fn stop_observing(&self, id: ObserverId) {
        self.observers.stop_observing(id);
    }

    /// Fetch the remote configuration and make it canonical.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote and decoding failures; the current state
    /// is left untouched and no observer runs.
    pub async fn load(&self) -> ConfigResult<Configuration> {
        let _guard = self.in_flight.lock().await;
        let body = self.transport.fetch_configuration().await?;
        self.accept(body, "load")
    }

    /// Send the current configuration and adopt the server's answer.
    ///
    /// # Errors
    ///
    /// Propagates encoding, transport, remote and decoding failures; the
    /// current state is left untouched and no observer runs.
    pub async fn save(&self) -> ConfigResult<Configuration> {
        let _guard = self.in_flight.lock().await;
        let payload = self
            .state
            .read(Configuration::to_value)
            .map_err(|source| ConfigError::Encode { source })?;
        let body = self.transport.persist_configuration(&payload).await?;
        self.accept(body, "save")
    }

    fn accept(&self, body: Value, operation: &'static str) -> ConfigResult<Configuration> {
        let next = Configuration::from_response(body)
            .map_err(|source| ConfigError::Decode { operation, source })?;
        let current = self.state.replace(next);
        let failed = self.observers.notify(&current);
        debug!(
            operation,
            observers = self.observers.len(),
            failed,
            "settings synchronized"
        );
        Ok(current)
    }
}
