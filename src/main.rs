mod cli;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use tagnav::App;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagnav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let root: PathBuf = std::fs::canonicalize(&cli.root)?;
    let config = cli::load_config(&cli, &root)?;
    let app = App::new(root, config);
    app.can_activate()?;

    match cli.command {
        Commands::Generate => {
            cli::generate(&app).await?;
        }
        Commands::Command => {
            cli::show_command(&app)?;
        }
        Commands::Hook => {
            cli::install_hooks(&app)?;
        }
        Commands::Search {
            query,
            exact,
            limit,
            format,
        } => {
            cli::search(&app, &query, exact, limit, format).await?;
        }
        Commands::Jump { seed, open } => {
            cli::jump(&app, seed, open).await?;
        }
        Commands::Watch => {
            cli::watch(&app).await?;
        }
    }

    Ok(())
}
