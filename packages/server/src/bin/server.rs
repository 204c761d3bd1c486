//! Watch-party server.
//!
//! Run with:
//! ```not_rust
//! MATINEE_TOKEN_SECRET=dev cargo run --bin matinee-server -- serve
//! MATINEE_TOKEN_SECRET=dev cargo run --bin matinee-server -- serve --host 0.0.0.0 --port 3000
//! MATINEE_TOKEN_SECRET=dev cargo run --bin matinee-server -- issue-token --user alice
//! ```

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use matinee_server::{
    app::build_server,
    config::ServerConfig,
    infrastructure::auth::{HmacTokenVerifier, TokenClaims},
};
use matinee_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "matinee-server")]
#[command(about = "Watch-party server with synchronized playback and room chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP and WebSocket server
    Serve(ServerConfig),
    /// Sign an access token for local development
    IssueToken(IssueTokenArgs),
}

#[derive(Args, Debug)]
struct IssueTokenArgs {
    /// User id to embed as `sub`
    #[arg(short, long)]
    user: String,

    /// Role to embed
    #[arg(short, long, default_value = "member")]
    role: String,

    /// Token lifetime in seconds; omit for a token that never expires
    #[arg(long)]
    ttl_secs: Option<i64>,

    /// Shared secret used to sign the token
    #[arg(long, env = "MATINEE_TOKEN_SECRET", hide_env_values = true)]
    token_secret: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let cli = Cli::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Command::Serve(config) => {
            let (host, port) = (config.host.clone(), config.port);
            let server = match build_server(&config, clock) {
                Ok(server) => server,
                Err(e) => {
                    tracing::error!("Invalid configuration: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = server.run(host, port).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::IssueToken(args) => {
            let exp = args
                .ttl_secs
                .map(|ttl| clock.now_millis() / 1000 + ttl);
            let verifier = HmacTokenVerifier::new(args.token_secret, clock);
            let claims = TokenClaims {
                sub: args.user,
                role: args.role,
                exp,
            };
            match verifier.sign(&claims) {
                Ok(token) => println!("{}", token),
                Err(e) => {
                    tracing::error!("Failed to sign token: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
