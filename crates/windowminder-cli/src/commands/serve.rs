use clap::Args;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use windowminder_core::{scheduler, server, ReceiverRegistry, WindowMinder};

use super::load_config;

#[derive(Args)]
pub struct ServeArgs {
    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,
    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
    /// Override `check_interval_secs` (0 disables scheduled checks)
    #[arg(long)]
    check_interval: Option<u64>,
}

pub fn run(explicit: Option<&Path>, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(explicit)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(interval) = args.check_interval {
        config.check_interval_secs = interval;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let minder = WindowMinder::from_config(&config, ReceiverRegistry::builtin()).into_shared();
        let app = server::router(minder.clone(), &config.server);

        let addr = format!("{}:{}", config.server.host, config.server.port);
        info!(%addr, "starting server");
        let listener = TcpListener::bind(&addr).await?;

        let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
        let checks = tokio::spawn(scheduler::run_periodic_checks(
            minder,
            Duration::from_secs(config.check_interval_secs),
            async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
            },
        ));

        let shutdown = async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
            let _ = stop_tx.send(true);
        };
        info!("startup completed");
        server::serve(listener, app, shutdown).await?;

        if let Err(e) = checks.await {
            error!(error = %e, "scheduled checks ended abnormally");
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
