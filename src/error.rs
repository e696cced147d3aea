use miette::Diagnostic;
use std::io;
use thiserror::Error;

use crate::game::{Phase, PlayerId};

/// Primary error type for the Impostor bot
#[derive(Error, Debug, Diagnostic)]
pub enum BotError {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(impostor::discord_error))]
    Discord(#[from] serenity::Error),

    #[error("Environment configuration error: {0}")]
    #[diagnostic(code(impostor::config_error))]
    Config(String),

    #[error("Word bank error: {0}")]
    #[diagnostic(code(impostor::word_bank_error))]
    WordBank(#[from] WordBankError),

    #[error("{0}")]
    #[diagnostic(code(impostor::session_error))]
    Session(#[from] SessionError),

    #[error("Actor system error: {0}")]
    #[diagnostic(code(impostor::actor_error))]
    Actor(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(impostor::io_error))]
    Io(#[from] io::Error),
}

/// Word bank errors
#[derive(Error, Debug, Diagnostic)]
pub enum WordBankError {
    #[error("Failed to load word list: {0}")]
    #[diagnostic(code(impostor::words::load_error))]
    LoadError(#[from] io::Error),

    #[error("Word list format error: {0}")]
    #[diagnostic(
        code(impostor::words::format_error),
        help("expected a JSON object mapping category names to arrays of words")
    )]
    FormatError(String),

    #[error("No words available to draw from")]
    #[diagnostic(code(impostor::words::empty_category))]
    EmptyCategory,
}

/// Rejections returned by the game engine. None of these leave the session
/// in a partially updated state.
#[derive(Error, Debug, Diagnostic)]
pub enum GameError {
    #[error("At least 3 players are needed, only {joined} joined")]
    #[diagnostic(code(impostor::game::insufficient_players))]
    InsufficientPlayers { joined: usize },

    #[error("Invalid game settings: {reason}")]
    #[diagnostic(code(impostor::game::invalid_config))]
    InvalidConfig { reason: String },

    #[error("The game has already started")]
    #[diagnostic(code(impostor::game::already_started))]
    GameAlreadyStarted,

    #[error("It is not your turn")]
    #[diagnostic(code(impostor::game::not_your_turn))]
    NotYourTurn { current: Option<PlayerId> },

    #[error("Not possible while the game is {actual} (needs {expected})")]
    #[diagnostic(code(impostor::game::wrong_phase))]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("Round limit of {max_rounds} exceeded")]
    #[diagnostic(
        code(impostor::game::round_limit_exceeded),
        help("a new round was requested after the last round; this is a sequencing bug")
    )]
    RoundLimitExceeded { max_rounds: u32 },

    #[error("Could not draw a secret word: {0}")]
    #[diagnostic(code(impostor::game::words))]
    Words(#[from] WordBankError),
}

/// Errors from the session coordinator
#[derive(Error, Debug, Diagnostic)]
pub enum SessionError {
    #[error("There is no active game here")]
    #[diagnostic(code(impostor::session::no_active_game))]
    NoActiveGame,

    #[error("A game is already running here")]
    #[diagnostic(code(impostor::session::exists))]
    SessionExists,

    #[error("{0}")]
    #[diagnostic(code(impostor::session::game))]
    Game(#[from] GameError),
}

// Re-export error types for convenience
pub use BotError as Error;

/// Create a result type that uses our error type
pub type Result<T> = std::result::Result<T, Error>;
