//! Oracle ledger - scenario replay entry point
//!
//! Replays a YAML scenario through a single-writer ledger service, hands each
//! settlement report to the configured sink and prints the final snapshot.

use anyhow::{bail, Context};
use clap::{Arg, Command};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oracle_ledger::{
    report::sink_from_config, scenario, LedgerConfig, MarketRegistry, Scenario, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("oracle-ledger")
        .version(VERSION)
        .about("Prediction oracle ledger - scenario replay")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("Scenario YAML to replay"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("OUTPUT")
                .help("Generate example config and exit"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error); overrides the config"),
        )
        .get_matches();

    // Handle config generation
    if let Some(output_path) = matches.get_one::<String>("generate-config") {
        LedgerConfig::default()
            .save_to_file(output_path)
            .with_context(|| format!("writing config to {}", output_path))?;
        println!("Generated example config at: {}", output_path);
        return Ok(());
    }

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let config = LedgerConfig::load(config_path).context("loading configuration")?;

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&log_level, config.logging.json)?;

    info!(version = VERSION, "Oracle ledger starting");

    let Some(scenario_path) = matches.get_one::<String>("scenario") else {
        bail!("no scenario given; pass --scenario FILE");
    };
    let scenario = Scenario::from_file(scenario_path)
        .with_context(|| format!("reading scenario {}", scenario_path))?;

    let registry = MarketRegistry::new(config.service.channel_capacity);
    let handle = registry.open_market();
    let sink = sink_from_config(&config.report);
    info!(market = %handle.market(), sink = sink.name(), "Market opened for replay");

    let summary = tokio::select! {
        summary = scenario::replay(&scenario, &handle, sink.as_ref()) => summary?,
        _ = shutdown_signal() => {
            warn!("Shutdown signal received, abandoning replay");
            return Ok(());
        }
    };

    let ledger = registry.close_market(&handle.market()).await?;
    ledger.check_invariants()?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("Oracle ledger stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(log_level: &str, json: bool) -> anyhow::Result<()> {
    let level: tracing::Level = log_level
        .parse()
        .with_context(|| format!("invalid log level: {}", log_level))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("oracle_ledger={}", level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
