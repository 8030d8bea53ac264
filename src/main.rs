use clap::Parser;
use lesson_teams::cli::{self, Cli, Command};
use lesson_teams::config::AppConfig;
use lesson_teams::infrastructure::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    match cli.command {
        Command::Login(args) => cli::login::run(args, &config, cli.identity).await,
        command => cli::teams::run(command, &config, cli.fixture, cli.identity).await,
    }
}
