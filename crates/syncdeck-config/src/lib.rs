#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Settings synchronization against the sync service's `/config` endpoint.
//!
//! Layout: `model.rs` (typed configuration and baselines), `validate.rs`
//! (field editing and local checks), `client.rs` (`RemoteConfigClient` and the
//! `ConfigTransport` seam), `observer.rs` (`ObserverRegistry`), `store.rs`
//! (`SettingsStore`).

pub mod client;
pub mod error;
pub mod model;
pub mod observer;
pub mod store;
pub mod validate;

pub use client::{CONFIG_PATH, ClientConfig, ConfigTransport, DEFAULT_BASE_URL, RemoteConfigClient};
pub use error::{ConfigError, ConfigResult, RemoteError};
pub use model::{Configuration, Debugging, Logs, Service, UpdateFrequency, Updates};
pub use observer::{Observer, ObserverId, ObserverRegistry};
pub use store::{SettingsStore, SharedConfiguration};
pub use validate::SECTION_FIELDS;
