//! OMF relay publisher - sends simulated fleet telemetry to a relay ingress
//! endpoint, buffering samples on disk while the relay is unreachable.

mod app;
mod self_test;

use app::{Relay, RunOptions};
use clap::Parser;
use relay_config_and_utils::{init_logging, EndpointConfig, Paths, RunMode, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

/// OMF relay publisher command-line interface.
#[derive(Parser, Debug)]
#[command(name = "omf-relay")]
#[command(about = "Publish simulated vehicle telemetry to an OMF relay")]
#[command(version)]
struct Cli {
    /// Relay host name or address
    host: String,

    /// Port the relay listens on
    port: u16,

    /// Optional ingress path (starting with `/`) followed by `tests` or `noCertCheck`
    #[arg(value_name = "URN|MODE", num_args = 0..=2)]
    extra: Vec<String>,

    /// Producer token sent with every message
    #[arg(long, env = "OMF_PRODUCER_TOKEN", hide_env_values = true)]
    producer_token: Option<String>,

    /// Base directory for the buffer, logs and config. Defaults to ~/.omf-relay
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// How long to collect samples
    #[arg(long, default_value_t = 20)]
    run_minutes: u64,

    /// Seconds between sample batches
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    sample_interval_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let endpoint = match EndpointConfig::from_args(&cli.host, cli.port, &cli.extra) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let paths = match cli.base_dir.clone() {
        Some(base) => Paths::with_base_dir(base),
        None => match Paths::new() {
            Ok(paths) => paths,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let mut settings = match Settings::load(&paths) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading {}: {}", paths.config_file().display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level.clone() {
        settings.log_level = level;
    }
    if let Some(token) = cli.producer_token.clone() {
        settings.producer_token = token;
    }

    if let Err(e) = init_logging(&settings.log_level, paths.log_file()) {
        eprintln!("Warning: file logging unavailable: {}", e);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %endpoint.mode,
        "Starting OMF relay publisher v{}",
        env!("CARGO_PKG_VERSION")
    );

    if endpoint.mode == RunMode::SelfTest {
        info!("Running self-tests");
        let passed = self_test::run().await;
        info!(passed, "Finished running self-tests");
        return if passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let mut relay = match Relay::init(&endpoint, &settings, &paths) {
        Ok(relay) => relay,
        Err(e) => {
            error!(error = %e, "Cannot start the relay publisher");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions {
        run_duration: Duration::from_secs(cli.run_minutes * 60),
        sample_interval: Duration::from_secs(cli.sample_interval_secs),
    };

    let code = tokio::select! {
        result = relay.run(options) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "Relay publisher stopped");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
            ExitCode::SUCCESS
        }
    };

    match relay.pending() {
        Ok(0) => {}
        Ok(pending) => info!(pending, "Messages left in the buffer for the next run"),
        Err(e) => warn!(error = %e, "Could not count buffered messages"),
    }
    info!("Ending OMF relay publisher");
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_positionals_and_defaults() {
        let cli = Cli::try_parse_from(["omf-relay", "relay.local", "5460"]).unwrap();
        assert_eq!(cli.host, "relay.local");
        assert_eq!(cli.port, 5460);
        assert!(cli.extra.is_empty());
        assert_eq!(cli.run_minutes, 20);
        assert_eq!(cli.sample_interval_secs, 10);
    }

    #[test]
    fn cli_accepts_urn_and_mode() {
        let cli = Cli::try_parse_from([
            "omf-relay",
            "relay.local",
            "5460",
            "/ingress/messages",
            "noCertCheck",
            "--run-minutes",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.extra, vec!["/ingress/messages", "noCertCheck"]);
        assert_eq!(cli.run_minutes, 1);
    }

    #[test]
    fn cli_rejects_bad_usage() {
        assert!(Cli::try_parse_from(["omf-relay", "relay.local"]).is_err());
        assert!(Cli::try_parse_from(["omf-relay", "relay.local", "not-a-port"]).is_err());
        assert!(Cli::try_parse_from(["omf-relay", "h", "1", "/a", "t", "n"]).is_err());
        assert!(
            Cli::try_parse_from(["omf-relay", "h", "1", "--sample-interval-secs", "0"]).is_err()
        );
    }
}
