use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use syncdeck_config::DEFAULT_BASE_URL;
use syncdeck_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::client::{AppContext, CliResult, build_http_client, parse_url};
use crate::commands::config::{handle_config_get, handle_config_set, handle_config_watch};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CLI_LOG_LEVEL: &str = "warn";
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 5;

#[derive(Parser)]
#[command(
    name = "syncdeck",
    about = "Inspect and edit the settings of a running sync service"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "SYNCDECK_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_BASE_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "SYNCDECK_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "SYNCDECK_LOG_LEVEL",
        default_value = DEFAULT_CLI_LOG_LEVEL
    )]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "SYNCDECK_LOG_FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Read or change the service configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Print the current configuration.
    Get(ConfigGetArgs),
    /// Change one or more fields and save.
    Set(ConfigSetArgs),
    /// Poll the configuration and print it whenever it changes.
    Watch(ConfigWatchArgs),
}

#[derive(Default, Args)]
pub(crate) struct ConfigGetArgs {}

#[derive(Args)]
pub(crate) struct ConfigSetArgs {
    /// `Section.Field=value` pairs, e.g. `Logs.MaxFilesNumber=5`.
    #[arg(required = true, value_name = "KEY=VALUE")]
    pub(crate) assignments: Vec<String>,
}

#[derive(Args)]
pub(crate) struct ConfigWatchArgs {
    /// Seconds between polls.
    #[arg(
        long,
        default_value_t = DEFAULT_WATCH_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) interval: u64,
    /// Stop after this many polls instead of waiting for Ctrl-C.
    #[arg(long)]
    pub(crate) count: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse()
}

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    let span = info_span!("syncdeck_cli", command = command_name, trace_id = %trace_id);

    let result = execute(cli, &trace_id).instrument(span).await;

    match result {
        Ok(()) => {
            debug!(command = command_name, "command completed");
            0
        }
        Err(err) => {
            let exit_code = err.exit_code();
            eprintln!("error: {}", err.display_message());
            debug!(command = command_name, exit_code, "command failed");
            exit_code
        }
    }
}

async fn execute(cli: Cli, trace_id: &str) -> CliResult<()> {
    let client = build_http_client(cli.timeout, trace_id)?;
    let ctx = AppContext {
        client,
        base_url: cli.api_url,
    };
    dispatch(&ctx, cli.command, cli.output).await
}

async fn dispatch(ctx: &AppContext, command: Command, output: OutputFormat) -> CliResult<()> {
    match command {
        Command::Config(config) => match config {
            ConfigCommand::Get(_) => handle_config_get(ctx, output).await,
            ConfigCommand::Set(args) => handle_config_set(ctx, args, output).await,
            ConfigCommand::Watch(args) => handle_config_watch(ctx, args, output).await,
        },
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Config(ConfigCommand::Get(_)) => "config_get",
        Command::Config(ConfigCommand::Set(_)) => "config_set",
        Command::Config(ConfigCommand::Watch(_)) => "config_watch",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn defaults_point_at_local_service() -> Result<()> {
        let cli = Cli::try_parse_from(["syncdeck", "config", "get"])?;
        assert_eq!(cli.api_url.as_str(), "http://localhost:3636/");
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cli.output, OutputFormat::Table);
        assert!(cli.log_format.is_none());
        assert_eq!(command_label(&cli.command), "config_get");
        Ok(())
    }

    #[test]
    fn global_flags_follow_subcommands() -> Result<()> {
        let cli = Cli::try_parse_from([
            "syncdeck",
            "config",
            "set",
            "Logs.MaxFilesNumber=5",
            "Service.AutoStart=true",
            "--output",
            "json",
            "--log-format",
            "json",
            "--api-url",
            "http://10.0.0.2:3636",
        ])?;
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.api_url.host_str(), Some("10.0.0.2"));
        let Command::Config(ConfigCommand::Set(args)) = cli.command else {
            return Err(anyhow!("expected config set"));
        };
        assert_eq!(args.assignments.len(), 2);
        Ok(())
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["syncdeck", "config", "set"]).is_err());
        assert!(Cli::try_parse_from(["syncdeck", "config", "watch", "--interval", "0"]).is_err());
        assert!(Cli::try_parse_from(["syncdeck", "--api-url", "::", "config", "get"]).is_err());
        assert!(
            Cli::try_parse_from(["syncdeck", "--log-format", "xml", "config", "get"]).is_err()
        );
    }

    #[tokio::test]
    async fn execute_reports_remote_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/config");
            then.status(500).json_body(json!({"error": "disk full"}));
        });

        let url = server.base_url();
        let cli = Cli::try_parse_from(["syncdeck", "--api-url", url.as_str(), "config", "get"])?;
        let err = execute(cli, "trace")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected failure"))?;
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.display_message(), "disk full (status 500)");
        Ok(())
    }
}
