use dotenvy::dotenv;
use miette::IntoDiagnostic;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::game::GameSettings;
use crate::Error;

pub struct Config {
    pub discord_token: String,
    pub bot_activity: String,
    /// JSON word list; the built-in words are used when unset
    pub word_list_path: Option<PathBuf>,
    pub join_window: Duration,
    pub discussion: Duration,
    pub voting: Duration,
    pub role_reveal_delay: Duration,
    pub default_settings: GameSettings,
}

pub fn load_config() -> miette::Result<Config> {
    info!("Loading configuration");

    // Load environment variables
    dotenv().ok();

    // Get required environment variables
    let discord_token = env::var("DISCORD_TOKEN")
        .into_diagnostic()
        .map_err(|_| Error::Config("Missing DISCORD_TOKEN".to_string()))?;

    let bot_activity = env::var("BOT_ACTIVITY").unwrap_or_else(|_| "Impostor".to_string());

    let word_list_path = env::var("WORD_LIST_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from);

    let default_settings = GameSettings {
        impostor_count: env_or("DEFAULT_IMPOSTORS", 1)?,
        max_rounds: env_or("DEFAULT_ROUNDS", 3)?,
    };

    Ok(Config {
        discord_token,
        bot_activity,
        word_list_path,
        join_window: Duration::from_secs(env_or("JOIN_WINDOW_SECS", 180)?),
        discussion: Duration::from_secs(env_or("DISCUSSION_SECS", 180)?),
        voting: Duration::from_secs(env_or("VOTING_SECS", 30)?),
        role_reveal_delay: Duration::from_secs(env_or("ROLE_REVEAL_DELAY_SECS", 10)?),
        default_settings,
    })
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, Error> {
    parse_or(name, env::var(name).ok(), default)
}

/// Parse an optional raw value, falling back to `default` when it is unset
fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, Error> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("Invalid {}: '{}'", name, raw))),
    }
}
