//! Tally Dashboard - renders the back-office screens as JSON.
//!
//! Settings come from the environment (or a `.env` file); see
//! [`Config::from_env`] for the variables.

use tally_dashboard::{screens, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr, screens to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_dashboard=debug,tally_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        screens = config.screens.len(),
        page_size = config.page_size,
        "Starting Tally Dashboard"
    );

    for screen in &config.screens {
        let rendered = screens::render(*screen, &config)?;
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    }

    Ok(())
}
