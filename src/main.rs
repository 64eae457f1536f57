use clap::Parser;
use env_logger::Env;
use log::{error, info};

pub mod cli;
pub mod kafka;

use cli::*;
use kafka::ConsumerSettings;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let settings = ConsumerSettings::from_args(args);

    if let Err(e) = write_banner(&mut std::io::stdout(), &settings) {
        eprintln!("Error writing banner: {}", e);
        std::process::exit(1);
    }

    match consume_topic(&settings).await {
        Ok(outcome) => {
            info!("Consumer finished after {} messages", outcome.processed);
            std::process::exit(outcome.exit_code());
        }
        Err(e) => {
            error!("Application error: {:#}", e);
            eprintln!("Application error: {:#}", e);
            std::process::exit(1);
        }
    }
}
