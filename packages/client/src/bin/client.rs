//! Watch-party CLI client with reconnection support.
//!
//! Connects to the server's WebSocket endpoint with a signed access token,
//! optionally joins a room right away, and keeps a simulated player in sync
//! with the owner. Automatically reconnects on disconnection (max 5 attempts
//! with 5 second interval) and re-joins the last room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin matinee-client -- --token <token>
//! cargo run --bin matinee-client -- -t <token> --room <roomId>
//! ```

use clap::Parser;

use matinee_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "matinee-client")]
#[command(about = "Watch-party client that follows the owner's playback", long_about = None)]
struct Args {
    /// Signed access token
    #[arg(short = 't', long, env = "MATINEE_TOKEN", hide_env_values = true)]
    token: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to join after connecting
    #[arg(short = 'r', long)]
    room: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = matinee_client::run_client(args.url, args.token, args.room).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
