use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "shelf", version, about = "Book record service")]
struct Cli {
    /// Environment to load (overrides SHELF_ENV), e.g. `test` selects the test data set
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Print the resolved settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_for(cli.env.as_deref())
        .with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => shelf_app::app::serve(settings).await,
        Command::Migrate => {
            let applied = shelf_app::app::migrate(&settings).await?;
            tracing::info!(applied, dataset = %settings.dataset(), "migrations applied");
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
