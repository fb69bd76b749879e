//! Djinn CLI entry point.

use clap::Parser;

use djinn::cli::{handle_error, Cli, Commands};
use djinn::infrastructure::config::ConfigLoader;
use djinn::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_layered(&cli.config) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LogConfig::try_from(&config.logging).and_then(|log| LoggerImpl::init(&log)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => djinn::cli::commands::init::execute(args, &config, &cli.config, cli.json).await,
        Commands::Query(args) => djinn::cli::commands::query::execute(args, &config, cli.json).await,
        Commands::Chat(args) => djinn::cli::commands::chat::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
