//! Platform-independent game rules. Nothing in here performs I/O.

mod engine;
mod intent;
mod types;
mod voting;

pub use engine::{ClueOutcome, GameEngine, StatusSnapshot, TurnAdvance};
pub use intent::{GameSummary, Intent, PlayerRef, RoleDelivery, RolePayload, JOIN_OPTIONS};
pub use types::{
    CancelReason, Clue, GameOutcome, GameOverReason, GameSettings, Phase, Player, PlayerId,
    PollId, PollKind, Role, SessionId, Team, MAX_ROUNDS, MIN_PLAYERS, MIN_ROUNDS,
};
pub use voting::{tally, verdict, RoundOutcome, Verdict, VoteResolution};
