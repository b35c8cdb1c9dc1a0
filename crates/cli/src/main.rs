use anyhow::Context;
use booklist_app::app::{self, StoreBackend};
use booklist_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Book listing service command-line interface
#[derive(Debug, Parser)]
#[command(name = "booklist", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Keep listings in process memory instead of MongoDB
        #[arg(long)]
        in_memory: bool,
    },
    /// Connect to the configured database and ping it
    Check,
    /// Print the resolved settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load booklist settings")?;

    match cli.command {
        Command::Serve { in_memory } => {
            booklist_telemetry::init(&settings.telemetry)?;
            let backend = if in_memory {
                StoreBackend::InMemory
            } else {
                StoreBackend::Mongo
            };
            app::serve(settings, backend).await
        }
        Command::Check => {
            booklist_telemetry::init(&settings.telemetry)?;
            booklist_db::connect(&settings.database).await?;
            println!(
                "database '{}' is reachable (collection '{}')",
                settings.database.name, settings.database.collection
            );
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
