use clap::Parser;
use metal_premium::cli::{print_config, Cli, Commands};
use metal_premium::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    metal_premium::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting poller");
            args.execute(&config).await?;
        }
        Commands::Once(args) => {
            args.execute(&config).await?;
        }
        Commands::Convert(args) => {
            args.execute(&config).await?;
        }
        Commands::Serve(args) => {
            tracing::info!("Starting worker");
            args.execute(&config).await?;
        }
        Commands::Config => print_config(&config),
    }

    Ok(())
}
