//! carpark-finder CLI entry point
//!
//! Carpark discovery and ranking - CLI + web API

use carpark_finder::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
