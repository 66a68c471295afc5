//! RemitLend backend CLI

use clap::Parser;

use remitlend_backend::cli::{execute, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    execute(cli).await
}
