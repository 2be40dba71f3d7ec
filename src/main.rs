use clap::Parser;
use market_indices::cli::{Cli, Commands};
use market_indices::config::{Config, PORT_ENV};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });
    config.apply_port_override(std::env::var(PORT_ENV).ok().as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve(args) => {
            market_indices::telemetry::init_telemetry(&config.telemetry)?;
            tracing::info!("Starting market indices service");
            args.execute(config).await?;
        }
        Commands::Fetch(args) => {
            market_indices::telemetry::init_logging(
                &config.telemetry.log_level,
                config.telemetry.log_format,
            )?;
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
