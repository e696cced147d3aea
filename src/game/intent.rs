//! Declarative instructions emitted by the engine. The engine never performs
//! I/O; the coordinator hands these to the transport layer.

use serde::Serialize;

use super::types::{CancelReason, Clue, GameOutcome, PlayerId, PollKind};
use super::voting::VoteResolution;

/// The two fixed answers of the join poll, in option order
pub const JOIN_OPTIONS: [&str; 2] = ["Yes, I want to play", "No"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum RolePayload {
    Citizen { secret_word: String },
    Impostor,
}

/// A private message carrying one player's role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDelivery {
    pub player: PlayerRef,
    pub payload: RolePayload,
}

/// Role reveal shown when the game ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub outcome: GameOutcome,
    pub secret_word: String,
    pub impostors: Vec<String>,
    pub citizens: Vec<String>,
    pub eliminated: Vec<String>,
    pub leaker: Option<String>,
    pub rounds_played: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "intent")]
pub enum Intent {
    ShowRoster {
        players: Vec<String>,
    },
    OpenPoll {
        kind: PollKind,
        options: Vec<String>,
    },
    ClosePoll {
        kind: PollKind,
    },
    OpenConfigMenu {
        players: Vec<String>,
        impostor_choices: Vec<usize>,
        round_choices: Vec<u32>,
    },
    AnnounceGameStart {
        players: usize,
        impostors: usize,
        max_rounds: u32,
    },
    SendRoles {
        deliveries: Vec<RoleDelivery>,
    },
    ReportRoleDelivery {
        delivered: usize,
        total: usize,
        failed: Vec<String>,
    },
    AnnounceRound {
        round: u32,
        max_rounds: u32,
        player: PlayerRef,
    },
    AnnounceTurn {
        player: PlayerRef,
    },
    RoundSummary {
        round: u32,
        clues: Vec<Clue>,
    },
    StartDiscussion {
        round: u32,
    },
    AnnounceVoteResult(VoteResolution),
    AnnounceGameOver(GameSummary),
    AnnounceCancelled {
        reason: CancelReason,
        joined: usize,
    },
}
