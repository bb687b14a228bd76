use apimock::api::MockServer;
use apimock::config::Config;
use apimock::logging::init_logging;
use apimock::store::InMemoryStore;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "apimock", version, about = "HTTP API mocking server")]
struct Args {
    /// Address to listen on (overrides `listen.host`)
    #[arg(long, env = "APIMOCK_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides `listen.port`)
    #[arg(short, long, env = "APIMOCK_PORT")]
    port: Option<u16>,

    /// YAML configuration file with listener settings and preloaded mocks
    #[arg(short, long, env = "APIMOCK_CONFIG")]
    config: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
        None => Config::default(),
    };
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    if let Some(port) = args.port {
        config.listen.port = port;
    }

    init_logging(args.log_json || config.log.json);

    let addr = config.listen.socket_addr()?;
    let store = Arc::new(InMemoryStore::new());
    config.load_mocks(&store)?;
    info!(mocks = store.list().len(), "Store ready");

    MockServer::new(addr, store).run().await
}
