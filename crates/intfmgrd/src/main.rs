//! intfmgrd entry point.
//!
//! Loads the declared interfaces from the configuration file and runs the
//! requested lifecycle action for each of them over a dry-run session,
//! printing the set operations that would be sent to the device.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gnmi_cfgmgr_common::{CancellationToken, CfgMgrResult, DryRunTransport, ResourceMgr};
use gnmi_intfmgrd::config::DEFAULT_CONFIG_PATH;
use gnmi_intfmgrd::{IntfMgr, IntfMgrConfig, InterfaceResource, InterfaceSpec};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Create every declared interface
    Create,
    /// Delete every declared interface
    Delete,
}

#[derive(Parser, Debug)]
#[command(name = "intfmgrd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Lifecycle action to run
    #[arg(value_enum, default_value_t = Action::Create)]
    action: Action,
}

fn init_logging(level: &str) -> Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("invalid log level '{}'", level))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

async fn apply(
    mgr: &IntfMgr<DryRunTransport>,
    ctx: &CancellationToken,
    action: Action,
    spec: &InterfaceSpec,
) -> CfgMgrResult<()> {
    match action {
        Action::Create => {
            let mut resource = InterfaceResource::new(&spec.name);
            let refresh = mgr.create(ctx, &mut resource, spec.clone()).await?;
            if let Some(e) = refresh.stale_reason() {
                warn!("{}: created, observed state not refreshed: {}", spec.name, e);
            }
            Ok(())
        }
        Action::Delete => {
            let mut resource = InterfaceResource::present(spec.clone());
            mgr.delete(ctx, &mut resource).await
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = IntfMgrConfig::load_or_default(&args.config)?;
    config.validate()?;

    info!(
        "Target {} (tls={}, timeout={:?}), {} interface(s) declared",
        config.device.address,
        config.device.tls,
        config.timeout(),
        config.interfaces.len()
    );

    let transport = Arc::new(DryRunTransport::new());
    let mgr = IntfMgr::with_paths(transport.clone(), Arc::new(config.path_table()?));

    let ctx = CancellationToken::new();
    let on_signal = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight calls");
            on_signal.cancel();
        }
    });

    for spec in &config.interfaces {
        tokio::time::timeout(config.timeout(), apply(&mgr, &ctx, args.action, spec))
            .await
            .with_context(|| format!("{}: timed out", spec.name))?
            .with_context(|| format!("{}: {:?} failed", spec.name, args.action))?;
    }

    let applied = transport.take_applied().await;
    println!("{}", serde_json::to_string_pretty(&applied)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("intfmgrd: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("--- Starting intfmgrd ---");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
