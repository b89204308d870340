use anyhow::Context;
use clap::Parser;

use rt_admission_control::api::config_dto::ControllerConfig;
use rt_admission_control::api::http;
use rt_admission_control::domain::admission::controller_handle::ControllerHandle;
use rt_admission_control::{build_controller, logger, start_controller};

/// Admission control for real-time publish/subscribe flows.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides `listenAddr` from the configuration.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    let (config, handle) = match &args.config {
        Some(path) => start_controller(path).with_context(|| format!("failed to start from '{}'", path))?,
        None => {
            log::warn!("No configuration given, starting with defaults and an empty topology.");
            let config = ControllerConfig::default();
            let handle = ControllerHandle::spawn(build_controller(&config));
            (config, handle)
        }
    };

    let listen_addr = args.listen.unwrap_or(config.listen_addr);
    http::serve(&listen_addr, handle).await.context("admission API stopped")?;

    Ok(())
}
