use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::types::{GameOutcome, PlayerId};

/// What a closed ballot decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Verdict {
    NoVotes,
    /// Several candidates share the highest count; nobody is eliminated
    Tie { indices: Vec<usize> },
    Elected { index: usize },
}

/// Whether the game goes on after a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RoundOutcome {
    Continue,
    GameOver(GameOutcome),
}

/// Result of closing a vote, handed to the coordinator for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteResolution {
    pub round: u32,
    /// Candidate names in ballot order
    pub candidates: Vec<String>,
    pub vote_counts: BTreeMap<usize, u32>,
    pub verdict: Verdict,
    pub eliminated_player: Option<PlayerId>,
    pub eliminated_name: Option<String>,
    pub was_impostor: Option<bool>,
    pub impostors_left: usize,
    pub outcome: RoundOutcome,
}

/// Count ballots per candidate index
pub fn tally(votes: &HashMap<PlayerId, usize>) -> BTreeMap<usize, u32> {
    let mut counts = BTreeMap::new();
    for index in votes.values() {
        *counts.entry(*index).or_insert(0) += 1;
    }
    counts
}

/// Pick the single most voted candidate. Ties are never broken.
pub fn verdict(counts: &BTreeMap<usize, u32>) -> Verdict {
    let Some(&top) = counts.values().max() else {
        return Verdict::NoVotes;
    };

    let leaders: Vec<usize> = counts
        .iter()
        .filter(|(_, &count)| count == top)
        .map(|(&index, _)| index)
        .collect();

    match leaders.as_slice() {
        [index] => Verdict::Elected { index: *index },
        _ => Verdict::Tie { indices: leaders },
    }
}
