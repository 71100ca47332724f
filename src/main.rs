use clap::Parser;

use minipaas::cli::{self, Cli};

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = cli::dispatch(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
