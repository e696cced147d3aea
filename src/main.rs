use tokio::signal;
use tokio::task::LocalSet;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impostor::{config, discord};

#[actix_rt::main]
async fn main() -> miette::Result<()> {
    // Set up logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "impostor=debug,serenity=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Impostor Discord bot");

    let config = config::load_config()?;

    // Create a local task set to ensure local tasks work properly
    let local = LocalSet::new();

    // Run the bot until it stops on its own or we are asked to shut down
    local
        .run_until(async {
            tokio::select! {
                result = discord::setup_bot(config) => result,
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping bot");
                    Ok(())
                }
            }
        })
        .await
}
