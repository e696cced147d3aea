use serde::Serialize;
use std::fmt;

use crate::error::GameError;

/// Opaque chat-platform user handle
pub type PlayerId = u64;
/// One session per chat channel
pub type SessionId = u64;
/// Token correlating platform poll answers with a session
pub type PollId = u64;

pub const MIN_PLAYERS: usize = 3;
pub const MIN_ROUNDS: u32 = 2;
pub const MAX_ROUNDS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Unassigned,
    Impostor,
    Citizen,
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WaitingForPlayers,
    RoleAssignment,
    PlayingRound,
    Discussing,
    Voting,
    ProcessingVotes,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::WaitingForPlayers => "waiting for players",
            Phase::RoleAssignment => "assigning roles",
            Phase::PlayingRound => "playing a round",
            Phase::Discussing => "discussing",
            Phase::Voting => "voting",
            Phase::ProcessingVotes => "counting votes",
            Phase::Finished => "finished",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSettings {
    pub impostor_count: usize,
    pub max_rounds: u32,
}

impl GameSettings {
    /// Most impostors allowed for a roster: one for every three players
    pub fn max_impostors(roster_size: usize) -> usize {
        (roster_size / 3).max(1)
    }

    /// Check the settings against the roster they would be applied to
    pub fn validate(&self, roster_size: usize) -> Result<(), GameError> {
        if roster_size < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers {
                joined: roster_size,
            });
        }

        let reason = if self.impostor_count < 1 {
            Some("there must be at least 1 impostor".to_string())
        } else if self.impostor_count >= roster_size {
            Some("there must be fewer impostors than players".to_string())
        } else if self.impostor_count > roster_size / 3 {
            Some(format!(
                "too many impostors, at most {} for {} players",
                Self::max_impostors(roster_size),
                roster_size
            ))
        } else if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&self.max_rounds) {
            Some(format!(
                "rounds must be between {} and {}",
                MIN_ROUNDS, MAX_ROUNDS
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(GameError::InvalidConfig { reason }),
            None => Ok(()),
        }
    }

    /// Fit default settings to a roster, used when the join window expires
    /// without an admin picking settings.
    pub fn clamped_for(&self, roster_size: usize) -> Self {
        Self {
            impostor_count: self
                .impostor_count
                .clamp(1, Self::max_impostors(roster_size)),
            max_rounds: self.max_rounds.clamp(MIN_ROUNDS, MAX_ROUNDS),
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            impostor_count: 1,
            max_rounds: 3,
        }
    }
}

/// One clue given during a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clue {
    pub player_id: PlayerId,
    pub display_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Impostors,
    Citizens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GameOverReason {
    AllImpostorsCaught,
    RoundsExhausted,
    SecretWordLeaked { leaker: PlayerId },
    /// Nobody is left to give clues
    NoActivePlayers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub winner: Team,
    pub reason: GameOverReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollKind {
    Join,
    Vote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Requested,
    NotEnoughPlayers,
}
