// ABOUTME: Entry point for debatemate — a terminal debate partner on a random topic of the day.
// ABOUTME: Loads config and secrets, sets up logging, and launches the app.

use debatemate::app::App;
use debatemate::config::{Config, Secrets};
use debatemate::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let log_path = telemetry::init(&Config::data_dir(), &config.log.level)?;
    let secrets = Secrets::load()?;

    tracing::info!(log = %log_path.display(), "debatemate starting");
    App::new(config, secrets).run().await
}
