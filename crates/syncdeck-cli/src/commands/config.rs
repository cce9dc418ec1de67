use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use syncdeck_config::Configuration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cli::{ConfigSetArgs, ConfigWatchArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, parse_assignment};
use crate::output::render_configuration;

pub(crate) async fn handle_config_get(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let store = ctx.settings_store()?;
    let config = store.load().await?;
    render_configuration(&config, format)
}

pub(crate) async fn handle_config_set(
    ctx: &AppContext,
    args: ConfigSetArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let assignments = args
        .assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<CliResult<Vec<_>>>()?;

    let store = ctx.settings_store()?;
    let mut draft = store.load().await?;
    for (key, value) in assignments {
        draft.assign(key, value)?;
    }
    draft.validate()?;

    store.update(|current| *current = draft);
    let saved = store.save().await?;
    info!(fields = args.assignments.len(), "settings saved");
    render_configuration(&saved, format)
}

pub(crate) async fn handle_config_watch(
    ctx: &AppContext,
    args: ConfigWatchArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let store = ctx.settings_store()?;

    let last_seen: Arc<Mutex<Option<Configuration>>> = Arc::default();
    let seen = Arc::clone(&last_seen);
    store.observe(move |config| {
        let mut last = seen
            .lock()
            .map_err(|_| anyhow!("watch state poisoned"))?;
        if last.as_ref() == Some(config) {
            return Ok(());
        }
        println!(
            "# {} configuration changed",
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        );
        render_configuration(config, format).map_err(|err| anyhow!(err.display_message()))?;
        *last = Some(config.clone());
        Ok(())
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut polls = 0_u64;
    let mut last_error: Option<CliError> = None;
    loop {
        if args.count.is_some_and(|limit| polls >= limit) {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                debug!(polls, "watch interrupted");
                break;
            }
        }
        polls += 1;
        match store.load().await {
            Ok(_) => last_error = None,
            Err(err) => {
                let err = CliError::from(err);
                warn!(error = %err.display_message(), "configuration poll failed");
                last_error = Some(err);
            }
        }
    }

    last_error.map_or(Ok(()), Err)
}
