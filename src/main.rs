use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use couch_gateway::config::{load_config, GatewayConfig};
use couch_gateway::discovery::consul::ConsulInstancer;
use couch_gateway::discovery::fixed::FixedInstancer;
use couch_gateway::discovery::Instancer;
use couch_gateway::http::HttpServer;
use couch_gateway::lifecycle::Shutdown;
use couch_gateway::observability::{logging, metrics};
use couch_gateway::pool::RoundRobinPool;
use couch_gateway::service::DocumentGateway;
use couch_gateway::store::couch::CouchConnector;
use couch_gateway::store::instrument::InstrumentedConnector;

#[derive(Debug, Parser)]
#[command(name = "couch-gateway", version, about = "HTTP document gateway over a discovered CouchDB cluster")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.database.name,
        service = %config.discovery.service_name,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                let labels = [
                    ("db_name", config.database.name.clone()),
                    ("db_kind", config.database.kind.clone()),
                    ("service_group", config.observability.service_group.clone()),
                    ("version", env!("CARGO_PKG_VERSION").to_string()),
                ];
                metrics::init_metrics(addr, &labels);
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    // Membership feed: pinned list when configured, Consul watch otherwise.
    let (instancer, watcher): (Box<dyn Instancer>, Option<JoinHandle<()>>) =
        if config.discovery.static_instances.is_empty() {
            let (instancer, handle) =
                ConsulInstancer::spawn(config.discovery.clone(), shutdown.subscribe())?;
            (Box::new(instancer), Some(handle))
        } else {
            tracing::info!(
                instances = config.discovery.static_instances.len(),
                "discovery disabled, using static instances"
            );
            let instancer = FixedInstancer::new(config.discovery.static_instances.clone());
            (Box::new(instancer), None)
        };

    let connector = InstrumentedConnector(CouchConnector::new(&config.database)?);
    let (pool, listener) =
        RoundRobinPool::spawn(instancer.as_ref(), connector, shutdown.subscribe());

    let gateway = Arc::new(DocumentGateway::new(pool));
    let server = HttpServer::new(&config, gateway);

    let socket = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(socket, shutdown.subscribe()).await?;

    // The server has drained; stop the background tasks too.
    shutdown.trigger();
    let _ = listener.await;
    if let Some(watcher) = watcher {
        let _ = watcher.await;
    }

    tracing::info!("shutdown complete");
    Ok(())
}
