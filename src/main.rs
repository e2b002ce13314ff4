use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use paysync::commands::{self, Cli};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("paysync=info".parse().expect("static directive"))
        .add_directive("sqlx=warn".parse().expect("static directive"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting paysync v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = commands::run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
