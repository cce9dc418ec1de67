use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::{Value, json};
use syncdeck_config::{
    ClientConfig, ConfigResult, ConfigTransport, Configuration, Debugging, SettingsStore, Updates,
};

fn store_for(server: &MockServer, seed: &Value) -> Result<SettingsStore> {
    let config = ClientConfig::parse(&server.base_url())?;
    Ok(SettingsStore::connect(&config, seed)?)
}

fn counting_observer(
    log: &Arc<Mutex<Vec<&'static str>>>,
    name: &'static str,
) -> impl Fn(&Configuration) -> anyhow::Result<()> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_: &Configuration| {
        log.lock()
            .map_err(|_| anyhow!("observer log poisoned"))?
            .push(name);
        Ok(())
    }
}

#[tokio::test]
async fn load_fills_sections_and_notifies_observers() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(json!({
            "Logs": {"Folder": "/var/log", "MaxFilesNumber": 5, "MaxFilesSize": 10, "MaxAgeDays": 7},
            "Updates": {},
            "Debugging": {},
            "Service": {}
        }));
    });

    let store = store_for(&server, &json!({"Logs": {"Folder": "/var/log"}}))?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.observe(move |config| {
        sink.lock()
            .map_err(|_| anyhow!("observer log poisoned"))?
            .push(config.clone());
        Ok(())
    });

    let loaded = store.load().await?;
    mock.assert();

    assert_eq!(loaded.logs.max_files_number, Some(5));
    assert_eq!(loaded.logs.max_age_days, Some(7));
    let seen = seen.lock().map_err(|_| anyhow!("observer log poisoned"))?;
    assert_eq!(seen.as_slice(), &[loaded]);
    Ok(())
}

#[tokio::test]
async fn seeded_store_applies_baselines_per_section() -> Result<()> {
    let server = MockServer::start_async().await;
    let store = store_for(
        &server,
        &json!({"Logs": {"Folder": "/var/log"}, "Updates": {}, "Service": {"AutoStart": true}}),
    )?;

    let config = store.configuration();
    assert_eq!(config.debugging, Debugging::baseline());
    assert_eq!(config.updates, Updates::default());
    assert_eq!(config.service.auto_start, Some(true));
    assert_eq!(config.logs.max_files_number, None);
    Ok(())
}

#[tokio::test]
async fn save_then_load_is_a_fixed_point_for_an_echoing_server() -> Result<()> {
    let server = MockServer::start_async().await;
    let mut expected = Configuration::default();
    expected.logs.folder = Some("/data/logs".into());
    expected.updates.update_channel = Some("beta".into());
    expected.service.auto_start = Some(true);
    let stored = expected.to_value()?;

    let put_body = stored.clone();
    let put = server.mock(move |when, then| {
        when.method(PUT).path("/config").json_body(put_body.clone());
        then.status(200).json_body(put_body);
    });
    let get_body = stored.clone();
    let get = server.mock(move |when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(get_body);
    });

    let store = store_for(&server, &stored)?;
    let saved = store.save().await?;
    let loaded = store.load().await?;

    put.assert();
    get.assert();
    assert_eq!(saved, expected);
    assert_eq!(loaded, expected);
    Ok(())
}

#[tokio::test]
async fn every_observer_runs_once_per_load_until_removed() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(json!({"Service": {"AutoStart": false}}));
    });

    let store = store_for(&server, &Value::Null)?;
    let log = Arc::new(Mutex::new(Vec::new()));
    store.observe(counting_observer(&log, "nav"));
    let settings_page = store.observe(counting_observer(&log, "settings"));
    store.observe(counting_observer(&log, "tray"));

    store.load().await?;
    assert_eq!(
        *log.lock().map_err(|_| anyhow!("poisoned"))?,
        vec!["nav", "settings", "tray"]
    );

    store.stop_observing(settings_page);
    log.lock().map_err(|_| anyhow!("poisoned"))?.clear();
    store.load().await?;
    assert_eq!(*log.lock().map_err(|_| anyhow!("poisoned"))?, vec!["nav", "tray"]);
    Ok(())
}

#[tokio::test]
async fn server_error_leaves_state_and_observers_untouched() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(500).json_body(json!({"error": "disk full"}));
    });

    let store = store_for(&server, &json!({"Logs": {"Folder": "/var/log"}}))?;
    let before = serde_json::to_vec(&store.configuration())?;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    store.observe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let err = store.load().await.err().ok_or_else(|| anyhow!("expected failure"))?;
    mock.assert();

    let remote = err.as_remote().ok_or_else(|| anyhow!("expected a remote error"))?;
    assert_eq!(remote.message, "disk full");
    assert_eq!(remote.status, Some(500));
    assert_eq!(serde_json::to_vec(&store.configuration())?, before);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn missing_section_in_response_is_replaced_not_merged() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(json!({
            "Logs": {"MaxFilesNumber": 2},
            "Debugging": {"ShowPanels": true},
            "Service": {}
        }));
    });

    let store = store_for(&server, &Value::Null)?;
    assert_eq!(store.configuration().updates.download_auto, Some(true));

    let loaded = store.load().await?;
    assert_eq!(loaded.updates, Updates::default());
    assert_eq!(loaded.updates.download_auto, None);
    assert_eq!(loaded.logs.folder, None);
    Ok(())
}

#[tokio::test]
async fn server_normalization_wins_over_sent_value() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(PUT).path("/config");
        then.status(200).json_body(json!({
            "Logs": {"MaxFilesNumber": 1, "MaxFilesSize": 30, "MaxAgeDays": 30, "Folder": "/normalized"},
            "Updates": {"Frequency": "restart"},
            "Debugging": {"ShowPanels": false},
            "Service": {"AutoStart": false}
        }));
    });

    let store = store_for(&server, &Value::Null)?;
    store.update(|config| config.logs.folder = Some("relative/path".into()));

    let saved = store.save().await?;
    assert_eq!(saved.logs.folder.as_deref(), Some("/normalized"));
    assert_eq!(store.configuration().logs.folder.as_deref(), Some("/normalized"));
    Ok(())
}

#[tokio::test]
async fn save_returns_fields_the_client_does_not_model() -> Result<()> {
    let server = MockServer::start_async().await;
    let stored = json!({
        "Logs": {"Folder": "/var/log", "MaxFilesNumber": 1, "MaxFilesSize": 30, "MaxAgeDays": 30, "Level": "debug"},
        "Updates": {"Frequency": "daily"},
        "Debugging": {"ShowPanels": false},
        "Service": {"AutoStart": false},
        "Proxy": {"Url": "http://p"}
    });
    let get_body = stored.clone();
    server.mock(move |when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(get_body);
    });
    let mut expected = stored.clone();
    expected["Service"]["AutoStart"] = json!(true);
    let put_body = expected.clone();
    let put = server.mock(move |when, then| {
        when.method(PUT).path("/config").json_body(put_body.clone());
        then.status(200).json_body(put_body);
    });

    let store = store_for(&server, &Value::Null)?;
    store.load().await?;
    store.update(|config| config.service.auto_start = Some(true));
    let saved = store.save().await?;

    put.assert();
    assert_eq!(saved.logs.extra.get("Level"), Some(&json!("debug")));
    assert_eq!(saved.extra.get("Proxy"), Some(&json!({"Url": "http://p"})));
    assert_eq!(saved.to_value()?, expected);
    Ok(())
}

#[tokio::test]
async fn negative_retention_loads() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(json!({
            "Logs": {"MaxAgeDays": -1},
            "Updates": {},
            "Debugging": {},
            "Service": {}
        }));
    });

    let store = store_for(&server, &Value::Null)?;
    let loaded = store.load().await?;
    assert_eq!(loaded.logs.max_age_days, Some(-1));
    assert!(loaded.validate().is_ok());
    Ok(())
}

/// Transport that records how many round-trips overlap.
#[derive(Default)]
struct OverlapTracker {
    active: AtomicUsize,
    max_active: Arc<AtomicUsize>,
}

impl OverlapTracker {
    async fn round_trip(&self, body: Value) -> ConfigResult<Value> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(body)
    }
}

#[async_trait]
impl ConfigTransport for OverlapTracker {
    async fn fetch_configuration(&self) -> ConfigResult<Value> {
        self.round_trip(json!({"Service": {"AutoStart": true}})).await
    }

    async fn persist_configuration(&self, value: &Value) -> ConfigResult<Value> {
        self.round_trip(value.clone()).await
    }
}

#[tokio::test]
async fn concurrent_load_and_save_do_not_overlap() -> Result<()> {
    let tracker = OverlapTracker::default();
    let max_active = Arc::clone(&tracker.max_active);
    let store = Arc::new(SettingsStore::new(tracker, &Value::Null)?);

    let saver = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.save().await })
    };
    let loader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.load().await })
    };

    saver.await??;
    loader.await??;
    assert_eq!(max_active.load(Ordering::SeqCst), 1);
    Ok(())
}
