use clap::Parser;
use log::info;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3002")]
    port: u16,

    /// Maximum number of simultaneous connections
    #[arg(short, long, default_value = "64")]
    max_clients: usize,

    /// Milliseconds between capybara decay ticks
    #[arg(short, long, default_value = "60000")]
    tick_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let mut server = Server::new(
        &address,
        Duration::from_millis(args.tick_ms.max(1)),
        args.max_clients,
    )
    .await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
