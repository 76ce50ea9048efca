use clap::Parser;
use docgen::Settings;
use docgen::cli::commands::{aggregate, config, list, watch};
use docgen::cli::{Cli, Commands};
use docgen::logging::Verbosity;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = settings.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    let verbosity = Verbosity::from_flags(cli.info, cli.command.is_quiet());
    docgen::logging::init_with_config(&settings.logging, verbosity);

    if cli.info {
        match &cli.config {
            Some(path) => tracing::debug!("[config] loaded from {}", path.display()),
            None => tracing::debug!("[config] workspace root: {:?}", Settings::workspace_root()),
        }
        tracing::debug!("[config] authoring root: {}", settings.authoring_root.display());
    }

    if let Err(e) = run(cli, &settings).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let start = docgen::cli::commands::start_dir(cli.root.as_deref())?;

    match cli.command {
        Commands::Aggregate {
            output_dir,
            mode,
            format,
            clean,
        } => {
            let args = aggregate::AggregateArgs {
                output_dir,
                mode,
                format,
                clean,
            };
            aggregate::run(args, &start, settings)?;
        }

        Commands::Watch {
            website_dir,
            mode,
            debounce,
            quiet: _,
            skip_initial,
        } => {
            let args = watch::WatchArgs {
                website_dir,
                mode,
                debounce,
                skip_initial,
            };
            watch::run(args, &start, settings).await?;
        }

        Commands::List { mode } => list::run(mode, &start, settings)?,

        Commands::Config => config::run(settings)?,
    }

    Ok(())
}
