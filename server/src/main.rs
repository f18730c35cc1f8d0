use clap::Parser;
use log::{error, info};
use server::levels::{BuiltinLevels, LevelCatalog};
use server::network::{Server, ServerMessage};
use server::registry::PlayerRegistry;
use server::router::EventRouter;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Maximum number of concurrent players
    #[arg(short, long, default_value = "32")]
    max_clients: usize,

    /// Level to start on
    #[arg(long, default_value = BuiltinLevels::DEFAULT_LEVEL)]
    map: String,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let catalog = BuiltinLevels::new();
    info!("Available maps: {}", catalog.level_names().join(", "));

    let registry = PlayerRegistry::new(Box::new(catalog), &args.map)?;
    let router = EventRouter::new(registry);

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(
        &address,
        args.max_clients,
        Duration::from_secs(args.timeout_secs),
        router,
    )
    .await?;

    let control = server.control_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            let _ = control.send(ServerMessage::Shutdown);
        }
    });

    if let Err(e) = server.run().await {
        error!("Server stopped with error: {}", e);
    }

    Ok(())
}
