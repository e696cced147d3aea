use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::intent::{GameSummary, Intent, PlayerRef, RoleDelivery, RolePayload, JOIN_OPTIONS};
use super::types::{
    CancelReason, Clue, GameOutcome, GameOverReason, GameSettings, Phase, Player, PlayerId,
    PollId, PollKind, Role, SessionId, Team, MAX_ROUNDS, MIN_PLAYERS, MIN_ROUNDS,
};
use super::voting::{self, RoundOutcome, Verdict, VoteResolution};
use crate::error::GameError;
use crate::words::WordBank;

/// Where the turn went after a clue or a skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAdvance {
    Next(PlayerId),
    /// Everyone active has played; the game is now in discussion
    RoundComplete { round: u32, clues: Vec<Clue> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClueOutcome {
    Accepted(TurnAdvance),
    /// The clue contained the secret word and the game is over
    Leaked(GameOutcome),
}

/// Read-only view of a session for status messages
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub session_id: SessionId,
    pub phase: Phase,
    pub round: u32,
    pub max_rounds: Option<u32>,
    pub players: usize,
    pub active_players: Vec<String>,
    pub eliminated: Vec<String>,
    pub current_player: Option<String>,
    pub clues: Vec<Clue>,
    pub delivery_failures: Vec<String>,
    pub outcome: Option<GameOutcome>,
}

/// State machine for a single game session.
///
/// Every operation either rejects without touching the session or commits
/// fully. Intents produced along the way are queued and must be collected
/// with [`GameEngine::drain_intents`] after each call.
pub struct GameEngine {
    session_id: SessionId,
    words: Arc<WordBank>,
    rng: StdRng,

    /// Players in join order
    roster: Vec<Player>,
    phase: Phase,
    settings: Option<GameSettings>,
    secret_word: Option<String>,

    /// Impostors still in the game
    impostors: BTreeSet<PlayerId>,
    citizens: BTreeSet<PlayerId>,

    /// Turn order drawn at assignment
    assigned_order: Vec<PlayerId>,
    /// Assignment order minus eliminated players, fixed for the current round
    turn_order: Vec<PlayerId>,
    eliminated: Vec<PlayerId>,
    played_this_round: Vec<PlayerId>,

    current_round: u32,
    turn_index: usize,
    current_player: Option<PlayerId>,
    round_clues: BTreeMap<u32, Vec<Clue>>,

    /// voter -> index into `turn_order`
    votes: HashMap<PlayerId, usize>,
    join_poll: Option<PollId>,
    vote_poll: Option<PollId>,

    delivery_failures: Vec<PlayerId>,
    outcome: Option<GameOutcome>,
    outbox: Vec<Intent>,
}

impl GameEngine {
    pub fn new(session_id: SessionId, words: Arc<WordBank>) -> Self {
        Self::with_rng(session_id, words, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(session_id: SessionId, words: Arc<WordBank>, seed: u64) -> Self {
        Self::with_rng(session_id, words, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(session_id: SessionId, words: Arc<WordBank>, rng: StdRng) -> Self {
        let mut engine = Self {
            session_id,
            words,
            rng,
            roster: Vec::new(),
            phase: Phase::WaitingForPlayers,
            settings: None,
            secret_word: None,
            impostors: BTreeSet::new(),
            citizens: BTreeSet::new(),
            assigned_order: Vec::new(),
            turn_order: Vec::new(),
            eliminated: Vec::new(),
            played_this_round: Vec::new(),
            current_round: 0,
            turn_index: 0,
            current_player: None,
            round_clues: BTreeMap::new(),
            votes: HashMap::new(),
            join_poll: None,
            vote_poll: None,
            delivery_failures: Vec::new(),
            outcome: None,
            outbox: Vec::new(),
        };

        info!("Session {} opened, waiting for players", session_id);
        engine.emit(Intent::OpenPoll {
            kind: PollKind::Join,
            options: JOIN_OPTIONS.iter().map(|o| o.to_string()).collect(),
        });
        engine
    }

    /// Take every intent queued since the last drain
    pub fn drain_intents(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, intent: Intent) {
        debug!("Session {} emits {:?}", self.session_id, intent);
        self.outbox.push(intent);
    }

    fn require_phase(&self, expected: Phase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Add a player to the lobby. Re-adding an id, or joining after the lobby
    /// closed, is a no-op.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>) -> bool {
        if self.phase != Phase::WaitingForPlayers {
            debug!(
                "Ignoring join from {} in session {}: game is {}",
                id, self.session_id, self.phase
            );
            return false;
        }
        if self.player(id).is_some() {
            return false;
        }

        let display_name = name.into();
        info!(
            "Player {} ({}) joined session {}, {} in total",
            display_name,
            id,
            self.session_id,
            self.roster.len() + 1
        );
        self.roster.push(Player {
            id,
            display_name,
            role: Role::Unassigned,
        });
        self.emit_roster();
        true
    }

    /// Withdraw a player while the lobby is still open
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if self.phase != Phase::WaitingForPlayers {
            return false;
        }
        let before = self.roster.len();
        self.roster.retain(|p| p.id != id);
        if self.roster.len() == before {
            return false;
        }

        info!("Player {} left session {}", id, self.session_id);
        self.emit_roster();
        true
    }

    fn emit_roster(&mut self) {
        let players = self.roster_names();
        self.emit(Intent::ShowRoster { players });
    }

    /// Close the lobby and ask for settings
    pub fn request_configuration(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, Phase::WaitingForPlayers | Phase::RoleAssignment) {
            return Err(GameError::GameAlreadyStarted);
        }
        let joined = self.roster.len();
        if joined < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers { joined });
        }

        self.enter_role_assignment();
        let players = self.roster_names();
        self.emit(Intent::OpenConfigMenu {
            players,
            impostor_choices: (1..=GameSettings::max_impostors(joined)).collect(),
            round_choices: (MIN_ROUNDS..=MAX_ROUNDS).collect(),
        });
        Ok(())
    }

    pub fn configure(&mut self, impostor_count: usize, max_rounds: u32) -> Result<(), GameError> {
        if !matches!(self.phase, Phase::WaitingForPlayers | Phase::RoleAssignment) {
            return Err(GameError::GameAlreadyStarted);
        }

        let settings = GameSettings {
            impostor_count,
            max_rounds,
        };
        settings.validate(self.roster.len())?;

        info!(
            "Session {} configured with {} impostor(s) and {} rounds",
            self.session_id, impostor_count, max_rounds
        );
        self.settings = Some(settings);
        self.enter_role_assignment();
        Ok(())
    }

    fn enter_role_assignment(&mut self) {
        if self.phase == Phase::WaitingForPlayers {
            self.phase = Phase::RoleAssignment;
            self.emit(Intent::ClosePoll {
                kind: PollKind::Join,
            });
        }
    }

    /// Deal roles, pick the secret word and start round 1
    pub fn assign_roles_and_start(&mut self) -> Result<(), GameError> {
        match self.phase {
            Phase::RoleAssignment => {}
            Phase::WaitingForPlayers => {
                return Err(GameError::WrongPhase {
                    expected: Phase::RoleAssignment,
                    actual: self.phase,
                })
            }
            _ => return Err(GameError::GameAlreadyStarted),
        }
        if self.secret_word.is_some() {
            return Err(GameError::GameAlreadyStarted);
        }

        let settings = self.settings.ok_or_else(|| GameError::InvalidConfig {
            reason: "the game has not been configured yet".to_string(),
        })?;
        settings.validate(self.roster.len())?;
        let secret_word = self.words.random_word_with(&mut self.rng, None)?;

        // Roles and turn order come from independent shuffles so the order
        // says nothing about who the impostors are.
        let mut ids: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        ids.shuffle(&mut self.rng);
        let (impostors, citizens) = ids.split_at(settings.impostor_count);
        self.impostors = impostors.iter().copied().collect();
        self.citizens = citizens.iter().copied().collect();

        for player in &mut self.roster {
            player.role = if self.impostors.contains(&player.id) {
                Role::Impostor
            } else {
                Role::Citizen
            };
        }

        let mut order: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        order.shuffle(&mut self.rng);
        self.assigned_order = order;
        self.secret_word = Some(secret_word.clone());
        self.current_round = 0;

        info!(
            "Session {} started: {} players, {} impostor(s), {} rounds",
            self.session_id,
            self.roster.len(),
            settings.impostor_count,
            settings.max_rounds
        );

        let deliveries = self
            .roster
            .iter()
            .map(|p| RoleDelivery {
                player: PlayerRef {
                    id: p.id,
                    name: p.display_name.clone(),
                },
                payload: match p.role {
                    Role::Impostor => RolePayload::Impostor,
                    _ => RolePayload::Citizen {
                        secret_word: secret_word.clone(),
                    },
                },
            })
            .collect();

        self.emit(Intent::AnnounceGameStart {
            players: self.roster.len(),
            impostors: settings.impostor_count,
            max_rounds: settings.max_rounds,
        });
        self.emit(Intent::SendRoles { deliveries });

        self.start_new_round()
    }

    /// Begin the next round with every player who has not been eliminated
    pub fn start_new_round(&mut self) -> Result<(), GameError> {
        let started = self.secret_word.is_some();
        let settings = match (self.phase, self.settings) {
            (Phase::RoleAssignment | Phase::ProcessingVotes, Some(settings)) if started => settings,
            _ => {
                return Err(GameError::WrongPhase {
                    expected: Phase::ProcessingVotes,
                    actual: self.phase,
                })
            }
        };

        if self.current_round >= settings.max_rounds {
            error!(
                "Session {} asked for round {} of {}",
                self.session_id,
                self.current_round + 1,
                settings.max_rounds
            );
            return Err(GameError::RoundLimitExceeded {
                max_rounds: settings.max_rounds,
            });
        }

        self.current_round += 1;
        self.turn_order = self
            .assigned_order
            .iter()
            .copied()
            .filter(|id| !self.eliminated.contains(id))
            .collect();
        self.turn_index = 0;
        self.played_this_round.clear();
        self.round_clues.insert(self.current_round, Vec::new());
        self.current_player = self.turn_order.first().copied();

        let Some(first) = self.current_player else {
            warn!(
                "Session {} has no active players left in round {}",
                self.session_id, self.current_round
            );
            self.finish(GameOutcome {
                winner: Team::Impostors,
                reason: GameOverReason::NoActivePlayers,
            });
            return Ok(());
        };

        info!(
            "Session {} round {}/{}, {} active players",
            self.session_id,
            self.current_round,
            settings.max_rounds,
            self.turn_order.len()
        );
        self.phase = Phase::PlayingRound;
        let player = self.player_ref(first);
        self.emit(Intent::AnnounceRound {
            round: self.current_round,
            max_rounds: settings.max_rounds,
            player,
        });
        Ok(())
    }

    /// Record the current player's clue and pass the turn on
    pub fn submit_clue(&mut self, player_id: PlayerId, text: &str) -> Result<ClueOutcome, GameError> {
        self.require_phase(Phase::PlayingRound)?;
        if self.current_player != Some(player_id) {
            return Err(GameError::NotYourTurn {
                current: self.current_player,
            });
        }

        let text = text.trim();
        if self.leaks_secret(text) {
            info!(
                "Player {} said the secret word in session {}",
                player_id, self.session_id
            );
            let outcome = GameOutcome {
                winner: Team::Impostors,
                reason: GameOverReason::SecretWordLeaked { leaker: player_id },
            };
            self.finish(outcome);
            return Ok(ClueOutcome::Leaked(outcome));
        }

        let clue = Clue {
            player_id,
            display_name: self.name_of(player_id),
            text: text.to_string(),
        };
        debug!(
            "Session {} round {}: {} gave '{}'",
            self.session_id, self.current_round, clue.display_name, clue.text
        );
        self.round_clues
            .entry(self.current_round)
            .or_default()
            .push(clue);

        self.advance_turn().map(ClueOutcome::Accepted)
    }

    fn leaks_secret(&self, text: &str) -> bool {
        match &self.secret_word {
            Some(word) => text.to_lowercase().contains(&word.to_lowercase()),
            None => false,
        }
    }

    /// Move to the next active player, or into discussion once everyone
    /// has played
    pub fn advance_turn(&mut self) -> Result<TurnAdvance, GameError> {
        self.require_phase(Phase::PlayingRound)?;

        if let Some(current) = self.current_player.take() {
            if !self.played_this_round.contains(&current) {
                self.played_this_round.push(current);
            }
        }

        let mut next = self.turn_index + 1;
        while next < self.turn_order.len() && self.is_eliminated(self.turn_order[next]) {
            next += 1;
        }
        self.turn_index = next;

        if let Some(&id) = self.turn_order.get(next) {
            self.current_player = Some(id);
            let player = self.player_ref(id);
            self.emit(Intent::AnnounceTurn { player });
            return Ok(TurnAdvance::Next(id));
        }

        self.phase = Phase::Discussing;
        let round = self.current_round;
        let clues = self.current_clues().to_vec();
        info!(
            "Session {} round {} complete with {} clues",
            self.session_id,
            round,
            clues.len()
        );
        self.emit(Intent::RoundSummary {
            round,
            clues: clues.clone(),
        });
        self.emit(Intent::StartDiscussion { round });
        Ok(TurnAdvance::RoundComplete { round, clues })
    }

    /// Pass the turn without a clue. Only the current player may do this
    /// unless `privileged` is set.
    pub fn skip_turn(
        &mut self,
        requester: PlayerId,
        privileged: bool,
    ) -> Result<TurnAdvance, GameError> {
        self.require_phase(Phase::PlayingRound)?;
        if !privileged && self.current_player != Some(requester) {
            return Err(GameError::NotYourTurn {
                current: self.current_player,
            });
        }

        info!(
            "Turn of {:?} skipped by {} in session {}",
            self.current_player, requester, self.session_id
        );
        self.advance_turn()
    }

    /// True once every active player in the round's turn order has played
    pub fn all_players_played(&self) -> bool {
        self.turn_order
            .iter()
            .filter(|id| !self.is_eliminated(**id))
            .all(|id| self.played_this_round.contains(id))
    }

    /// Open the ballot. The returned names line up index for index with the
    /// round's turn order, which is how votes are counted.
    pub fn begin_voting(&mut self) -> Result<Vec<String>, GameError> {
        self.require_phase(Phase::Discussing)?;

        self.votes.clear();
        self.phase = Phase::Voting;
        let candidates = self.candidate_names();
        info!(
            "Session {} voting opened with {} candidates",
            self.session_id,
            candidates.len()
        );
        self.emit(Intent::OpenPoll {
            kind: PollKind::Vote,
            options: candidates.clone(),
        });
        Ok(candidates)
    }

    /// Record a ballot; the last one per voter counts. Out-of-range indices
    /// are ignored and return `false`.
    pub fn register_vote(&mut self, voter: PlayerId, index: usize) -> Result<bool, GameError> {
        self.require_phase(Phase::Voting)?;

        if index >= self.turn_order.len() {
            debug!(
                "Ignoring vote for option {} from {} in session {}",
                index, voter, self.session_id
            );
            return Ok(false);
        }

        self.votes.insert(voter, index);
        debug!(
            "Session {}: {} voted for option {} ({} votes so far)",
            self.session_id,
            voter,
            index,
            self.votes.len()
        );
        Ok(true)
    }

    /// Current vote count per ballot index
    pub fn tally(&self) -> BTreeMap<usize, u32> {
        voting::tally(&self.votes)
    }

    /// Count the ballot, eliminate the most voted player if there is exactly
    /// one, then either end the game or start the next round
    pub fn close_voting(&mut self) -> Result<VoteResolution, GameError> {
        self.require_phase(Phase::Voting)?;

        self.phase = Phase::ProcessingVotes;
        self.emit(Intent::ClosePoll {
            kind: PollKind::Vote,
        });

        let vote_counts = self.tally();
        let verdict = voting::verdict(&vote_counts);
        let eliminated_player = match &verdict {
            Verdict::Elected { index } => self.turn_order.get(*index).copied(),
            _ => None,
        };

        let mut was_impostor = None;
        if let Some(id) = eliminated_player {
            let impostor = self.impostors.contains(&id);
            self.eliminate(id);
            was_impostor = Some(impostor);
            info!(
                "Session {} eliminated {} (impostor: {})",
                self.session_id, id, impostor
            );
        } else {
            info!("Session {} vote ended without elimination", self.session_id);
        }

        let max_rounds = self.max_rounds();
        let outcome = if self.impostors.is_empty() {
            RoundOutcome::GameOver(GameOutcome {
                winner: Team::Citizens,
                reason: GameOverReason::AllImpostorsCaught,
            })
        } else if self.current_round >= max_rounds {
            RoundOutcome::GameOver(GameOutcome {
                winner: Team::Impostors,
                reason: GameOverReason::RoundsExhausted,
            })
        } else {
            RoundOutcome::Continue
        };

        let resolution = VoteResolution {
            round: self.current_round,
            candidates: self.candidate_names(),
            vote_counts,
            verdict,
            eliminated_player,
            eliminated_name: eliminated_player.map(|id| self.name_of(id)),
            was_impostor,
            impostors_left: self.impostors.len(),
            outcome,
        };
        self.emit(Intent::AnnounceVoteResult(resolution.clone()));

        match outcome {
            RoundOutcome::GameOver(outcome) => self.finish(outcome),
            RoundOutcome::Continue => self.start_new_round()?,
        }
        Ok(resolution)
    }

    fn eliminate(&mut self, id: PlayerId) {
        if !self.eliminated.contains(&id) {
            self.eliminated.push(id);
        }
        self.impostors.remove(&id);
        self.citizens.remove(&id);
    }

    fn finish(&mut self, outcome: GameOutcome) {
        info!(
            "Session {} finished: {:?} win ({:?})",
            self.session_id, outcome.winner, outcome.reason
        );
        self.phase = Phase::Finished;
        self.current_player = None;
        self.outcome = Some(outcome);
        let summary = self.summary(outcome);
        self.emit(Intent::AnnounceGameOver(summary));
    }

    fn summary(&self, outcome: GameOutcome) -> GameSummary {
        let names_with = |role: Role| -> Vec<String> {
            self.roster
                .iter()
                .filter(|p| p.role == role)
                .map(|p| p.display_name.clone())
                .collect()
        };
        let leaker = match outcome.reason {
            GameOverReason::SecretWordLeaked { leaker } => Some(self.name_of(leaker)),
            _ => None,
        };

        GameSummary {
            outcome,
            secret_word: self.secret_word.clone().unwrap_or_default(),
            impostors: names_with(Role::Impostor),
            citizens: names_with(Role::Citizen),
            eliminated: self.eliminated.iter().map(|id| self.name_of(*id)).collect(),
            leaker,
            rounds_played: self.current_round,
        }
    }

    /// Remember which role messages could not be delivered
    pub fn report_delivery_failures(&mut self, failed: &[PlayerId]) {
        if self.secret_word.is_none() {
            debug!(
                "Ignoring delivery report for session {} before roles were dealt",
                self.session_id
            );
            return;
        }

        for id in failed {
            if self.player(*id).is_some() && !self.delivery_failures.contains(id) {
                self.delivery_failures.push(*id);
            }
        }

        let total = self.roster.len();
        let failed = self.delivery_failure_names();
        if !failed.is_empty() {
            warn!(
                "Session {}: roles could not be delivered to {}",
                self.session_id,
                failed.join(", ")
            );
        }
        self.emit(Intent::ReportRoleDelivery {
            delivered: total - failed.len(),
            total,
            failed,
        });
    }

    pub fn attach_poll(&mut self, kind: PollKind, poll_id: PollId) {
        match kind {
            PollKind::Join => self.join_poll = Some(poll_id),
            PollKind::Vote => self.vote_poll = Some(poll_id),
        }
    }

    pub fn poll(&self, kind: PollKind) -> Option<PollId> {
        match kind {
            PollKind::Join => self.join_poll,
            PollKind::Vote => self.vote_poll,
        }
    }

    /// Tear the session down, returning the last intents to deliver
    pub fn cancel(mut self, reason: CancelReason) -> Vec<Intent> {
        info!("Session {} cancelled ({:?})", self.session_id, reason);

        match self.phase {
            Phase::WaitingForPlayers => self.emit(Intent::ClosePoll {
                kind: PollKind::Join,
            }),
            Phase::Voting => self.emit(Intent::ClosePoll {
                kind: PollKind::Vote,
            }),
            _ => {}
        }
        let joined = self.roster.len();
        self.emit(Intent::AnnounceCancelled { reason, joined });
        self.drain_intents()
    }

    pub fn status(&self) -> StatusSnapshot {
        let active_players = if self.assigned_order.is_empty() {
            self.roster_names()
        } else {
            self.assigned_order
                .iter()
                .filter(|id| !self.is_eliminated(**id))
                .map(|id| self.name_of(*id))
                .collect()
        };

        StatusSnapshot {
            session_id: self.session_id,
            phase: self.phase,
            round: self.current_round,
            max_rounds: self.settings.map(|s| s.max_rounds),
            players: self.roster.len(),
            active_players,
            eliminated: self.eliminated.iter().map(|id| self.name_of(*id)).collect(),
            current_player: self.current_player.map(|id| self.name_of(id)),
            clues: self.current_clues().to_vec(),
            delivery_failures: self.delivery_failure_names(),
            outcome: self.outcome,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> Option<GameSettings> {
        self.settings
    }

    pub fn secret_word(&self) -> Option<&str> {
        self.secret_word.as_deref()
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn impostors(&self) -> &BTreeSet<PlayerId> {
        &self.impostors
    }

    pub fn citizens(&self) -> &BTreeSet<PlayerId> {
        &self.citizens
    }

    pub fn eliminated_players(&self) -> &[PlayerId] {
        &self.eliminated
    }

    pub fn is_eliminated(&self, id: PlayerId) -> bool {
        self.eliminated.contains(&id)
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.current_player
    }

    pub fn round_clues(&self, round: u32) -> &[Clue] {
        self.round_clues.get(&round).map_or(&[], Vec::as_slice)
    }

    pub fn votes(&self) -> &HashMap<PlayerId, usize> {
        &self.votes
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    fn current_clues(&self) -> &[Clue] {
        self.round_clues(self.current_round)
    }

    fn max_rounds(&self) -> u32 {
        self.settings.map_or(MAX_ROUNDS, |s| s.max_rounds)
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.player(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn player_ref(&self, id: PlayerId) -> PlayerRef {
        PlayerRef {
            id,
            name: self.name_of(id),
        }
    }

    fn roster_names(&self) -> Vec<String> {
        self.roster.iter().map(|p| p.display_name.clone()).collect()
    }

    fn candidate_names(&self) -> Vec<String> {
        self.turn_order.iter().map(|id| self.name_of(*id)).collect()
    }

    fn delivery_failure_names(&self) -> Vec<String> {
        self.delivery_failures
            .iter()
            .map(|id| self.name_of(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "pineapple";

    fn words() -> Arc<WordBank> {
        let table = BTreeMap::from([("Fruit".to_string(), vec![SECRET.to_string()])]);
        Arc::new(WordBank::from_categories(table).unwrap())
    }

    fn lobby(players: usize) -> GameEngine {
        let mut engine = GameEngine::with_seed(99, words(), 7);
        for id in 1..=players as PlayerId {
            engine.add_player(id, format!("P{}", id));
        }
        engine
    }

    fn started(players: usize, impostors: usize, rounds: u32) -> GameEngine {
        let mut engine = lobby(players);
        engine.configure(impostors, rounds).unwrap();
        engine.assign_roles_and_start().unwrap();
        engine.drain_intents();
        engine
    }

    /// Every active player gives a harmless clue
    fn play_round(engine: &mut GameEngine) {
        while let Some(player) = engine.current_player() {
            engine.submit_clue(player, "something yellow").unwrap();
        }
        assert_eq!(engine.phase(), Phase::Discussing);
    }

    fn index_of(engine: &GameEngine, id: PlayerId) -> usize {
        engine.turn_order().iter().position(|p| *p == id).unwrap()
    }

    fn first_impostor(engine: &GameEngine) -> PlayerId {
        *engine.impostors().iter().next().unwrap()
    }

    fn first_citizen(engine: &GameEngine) -> PlayerId {
        *engine.citizens().iter().next().unwrap()
    }

    #[test]
    fn test_new_session_opens_join_poll() {
        let mut engine = GameEngine::new(1, words());
        assert_eq!(engine.phase(), Phase::WaitingForPlayers);
        assert_eq!(
            engine.drain_intents(),
            vec![Intent::OpenPoll {
                kind: PollKind::Join,
                options: vec!["Yes, I want to play".to_string(), "No".to_string()],
            }]
        );
        assert!(engine.drain_intents().is_empty());
    }

    #[test]
    fn test_add_player_is_idempotent() {
        let mut engine = lobby(3);
        assert!(!engine.add_player(2, "Someone else"));
        assert_eq!(engine.roster().len(), 3);
        assert_eq!(engine.player(2).unwrap().display_name, "P2");

        assert!(engine.remove_player(3));
        assert!(!engine.remove_player(3));
        assert_eq!(engine.roster().len(), 2);
    }

    #[test]
    fn test_late_join_is_ignored() {
        let mut engine = started(3, 1, 2);
        assert!(!engine.add_player(40, "Late"));
        assert!(!engine.remove_player(1));
        assert_eq!(engine.roster().len(), 3);
        assert!(engine.drain_intents().is_empty());
    }

    #[test]
    fn test_configuration_needs_three_players() {
        let mut engine = lobby(2);
        assert!(matches!(
            engine.request_configuration(),
            Err(GameError::InsufficientPlayers { joined: 2 })
        ));
        assert!(matches!(
            engine.configure(1, 3),
            Err(GameError::InsufficientPlayers { .. })
        ));
        assert_eq!(engine.phase(), Phase::WaitingForPlayers);
    }

    #[test]
    fn test_configuration_menu() {
        let mut engine = lobby(7);
        engine.drain_intents();
        engine.request_configuration().unwrap();

        assert_eq!(engine.phase(), Phase::RoleAssignment);
        let intents = engine.drain_intents();
        assert_eq!(
            intents[0],
            Intent::ClosePoll {
                kind: PollKind::Join
            }
        );
        match &intents[1] {
            Intent::OpenConfigMenu {
                players,
                impostor_choices,
                round_choices,
            } => {
                assert_eq!(players.len(), 7);
                assert_eq!(impostor_choices, &vec![1, 2]);
                assert_eq!(round_choices, &vec![2, 3, 4, 5]);
            }
            other => panic!("Expected config menu, got {:?}", other),
        }

        // Joining is closed now
        assert!(!engine.add_player(8, "P8"));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut engine = lobby(6);
        for (impostors, rounds) in [(0, 3), (3, 3), (6, 3), (1, 1), (1, 6)] {
            assert!(matches!(
                engine.configure(impostors, rounds),
                Err(GameError::InvalidConfig { .. })
            ));
        }
        assert!(engine.settings().is_none());
        assert_eq!(engine.phase(), Phase::WaitingForPlayers);
    }

    #[test]
    fn test_start_requires_configuration() {
        let mut engine = lobby(3);
        assert!(matches!(
            engine.assign_roles_and_start(),
            Err(GameError::WrongPhase { .. })
        ));

        engine.request_configuration().unwrap();
        assert!(matches!(
            engine.assign_roles_and_start(),
            Err(GameError::InvalidConfig { .. })
        ));

        engine.configure(1, 2).unwrap();
        engine.assign_roles_and_start().unwrap();
        assert!(matches!(
            engine.assign_roles_and_start(),
            Err(GameError::GameAlreadyStarted)
        ));
        assert!(matches!(
            engine.configure(1, 3),
            Err(GameError::GameAlreadyStarted)
        ));
    }

    #[test]
    fn test_role_partition() {
        for players in 3..=15 {
            for impostors in 1..=players / 3 {
                let mut engine = lobby(players);
                engine.configure(impostors, 3).unwrap();
                engine.assign_roles_and_start().unwrap();

                let roster: BTreeSet<PlayerId> = engine.roster().iter().map(|p| p.id).collect();
                let union: BTreeSet<PlayerId> =
                    engine.impostors().union(engine.citizens()).copied().collect();

                assert_eq!(engine.impostors().len(), impostors);
                assert!(engine.impostors().is_disjoint(engine.citizens()));
                assert_eq!(union, roster);

                for player in engine.roster() {
                    let expected = if engine.impostors().contains(&player.id) {
                        Role::Impostor
                    } else {
                        Role::Citizen
                    };
                    assert_eq!(player.role, expected);
                }

                let mut order = engine.turn_order().to_vec();
                order.sort_unstable();
                assert_eq!(order, roster.into_iter().collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_start_emits_roles_and_first_round() {
        let mut engine = lobby(4);
        engine.configure(1, 2).unwrap();
        engine.drain_intents();
        engine.assign_roles_and_start().unwrap();

        assert_eq!(engine.secret_word(), Some(SECRET));
        assert_eq!(engine.current_round(), 1);
        assert_eq!(engine.phase(), Phase::PlayingRound);
        assert_eq!(engine.current_player(), engine.turn_order().first().copied());

        let intents = engine.drain_intents();
        assert!(matches!(
            intents[0],
            Intent::AnnounceGameStart {
                players: 4,
                impostors: 1,
                max_rounds: 2
            }
        ));
        match &intents[1] {
            Intent::SendRoles { deliveries } => {
                assert_eq!(deliveries.len(), 4);
                for delivery in deliveries {
                    let impostor = engine.impostors().contains(&delivery.player.id);
                    match &delivery.payload {
                        RolePayload::Impostor => assert!(impostor),
                        RolePayload::Citizen { secret_word } => {
                            assert!(!impostor);
                            assert_eq!(secret_word, SECRET);
                        }
                    }
                }
            }
            other => panic!("Expected role deliveries, got {:?}", other),
        }
        assert!(matches!(
            &intents[2],
            Intent::AnnounceRound { round: 1, max_rounds: 2, .. }
        ));
    }

    #[test]
    fn test_seeded_games_are_reproducible() {
        let a = started(6, 2, 3);
        let b = started(6, 2, 3);
        assert_eq!(a.impostors(), b.impostors());
        assert_eq!(a.turn_order(), b.turn_order());
        assert_eq!(a.secret_word(), b.secret_word());
    }

    #[test]
    fn test_turn_order_visits_everyone_once() {
        let mut engine = started(5, 1, 3);
        let order = engine.turn_order().to_vec();
        let mut visited = Vec::new();

        while let Some(player) = engine.current_player() {
            assert!(!engine.all_players_played());
            visited.push(player);
            engine
                .submit_clue(player, &format!("clue from {}", player))
                .unwrap();
        }

        assert_eq!(visited, order);
        assert!(engine.all_players_played());
        assert_eq!(engine.phase(), Phase::Discussing);

        let clues = engine.round_clues(1);
        assert_eq!(clues.len(), 5);
        assert_eq!(clues[0].player_id, order[0]);
        assert_eq!(clues[0].text, format!("clue from {}", order[0]));
    }

    #[test]
    fn test_round_completion_emits_summary() {
        let mut engine = started(3, 1, 2);
        let order = engine.turn_order().to_vec();

        engine.submit_clue(order[0], "one").unwrap();
        engine.submit_clue(order[1], "two").unwrap();
        let outcome = engine.submit_clue(order[2], "three").unwrap();

        match outcome {
            ClueOutcome::Accepted(TurnAdvance::RoundComplete { round, clues }) => {
                assert_eq!(round, 1);
                let texts: Vec<&str> = clues.iter().map(|c| c.text.as_str()).collect();
                assert_eq!(texts, vec!["one", "two", "three"]);
            }
            other => panic!("Expected round completion, got {:?}", other),
        }

        let intents = engine.drain_intents();
        assert!(matches!(intents[0], Intent::AnnounceTurn { .. }));
        assert!(matches!(intents[1], Intent::AnnounceTurn { .. }));
        assert!(matches!(intents[2], Intent::RoundSummary { round: 1, .. }));
        assert_eq!(intents[3], Intent::StartDiscussion { round: 1 });
    }

    #[test]
    fn test_clue_out_of_turn_is_rejected() {
        let mut engine = started(4, 1, 2);
        let order = engine.turn_order().to_vec();

        let result = engine.submit_clue(order[1], "sneaky");
        assert!(matches!(
            result,
            Err(GameError::NotYourTurn { current }) if current == Some(order[0])
        ));
        assert!(engine.round_clues(1).is_empty());
        assert_eq!(engine.current_player(), Some(order[0]));
    }

    #[test]
    fn test_secret_word_leak_ends_game() {
        let mut engine = started(4, 1, 3);
        let speaker = engine.current_player().unwrap();

        let outcome = engine.submit_clue(speaker, "I love PineApple pizza").unwrap();
        let expected = GameOutcome {
            winner: Team::Impostors,
            reason: GameOverReason::SecretWordLeaked { leaker: speaker },
        };

        assert_eq!(outcome, ClueOutcome::Leaked(expected));
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.outcome(), Some(expected));
        assert!(engine.round_clues(1).is_empty());

        match engine.drain_intents().last() {
            Some(Intent::AnnounceGameOver(summary)) => {
                assert_eq!(summary.secret_word, SECRET);
                assert_eq!(summary.leaker, Some(format!("P{}", speaker)));
                assert_eq!(summary.impostors.len(), 1);
                assert_eq!(summary.citizens.len(), 3);
            }
            other => panic!("Expected game over, got {:?}", other),
        }

        // Nothing else is accepted afterwards
        assert!(matches!(
            engine.begin_voting(),
            Err(GameError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_skip_turn() {
        let mut engine = started(3, 1, 2);
        let order = engine.turn_order().to_vec();

        assert!(matches!(
            engine.skip_turn(order[1], false),
            Err(GameError::NotYourTurn { .. })
        ));
        assert_eq!(
            engine.skip_turn(order[0], false).unwrap(),
            TurnAdvance::Next(order[1])
        );
        assert_eq!(
            engine.skip_turn(4242, true).unwrap(),
            TurnAdvance::Next(order[2])
        );
        assert!(engine.round_clues(1).is_empty());
    }

    #[test]
    fn test_votes_outside_voting_are_rejected() {
        let mut engine = started(3, 1, 2);
        assert!(matches!(
            engine.register_vote(1, 0),
            Err(GameError::WrongPhase {
                expected: Phase::Voting,
                actual: Phase::PlayingRound
            })
        ));
        assert!(matches!(
            engine.close_voting(),
            Err(GameError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_majority_vote_eliminates() {
        let mut engine = started(6, 2, 3);
        play_round(&mut engine);
        engine.begin_voting().unwrap();

        let target = engine.turn_order()[0];
        engine.register_vote(100, 0).unwrap();
        engine.register_vote(101, 0).unwrap();
        engine.register_vote(102, 1).unwrap();

        assert_eq!(engine.tally(), engine.tally());
        let resolution = engine.close_voting().unwrap();

        assert_eq!(resolution.verdict, Verdict::Elected { index: 0 });
        assert_eq!(resolution.vote_counts.get(&0), Some(&2));
        assert_eq!(resolution.eliminated_player, Some(target));
        assert_eq!(resolution.outcome, RoundOutcome::Continue);
        assert_eq!(engine.eliminated_players(), &[target]);

        // The eliminated player is gone from the next round and the ballot
        assert_eq!(engine.current_round(), 2);
        assert_eq!(engine.phase(), Phase::PlayingRound);
        assert!(!engine.turn_order().contains(&target));
        assert_eq!(engine.turn_order().len(), 5);
        assert!(engine.player(target).is_some());
    }

    #[test]
    fn test_tie_eliminates_nobody() {
        let mut engine = started(4, 1, 3);
        play_round(&mut engine);
        engine.begin_voting().unwrap();
        engine.register_vote(1, 0).unwrap();
        engine.register_vote(2, 1).unwrap();

        let resolution = engine.close_voting().unwrap();
        assert_eq!(resolution.verdict, Verdict::Tie { indices: vec![0, 1] });
        assert_eq!(resolution.eliminated_player, None);
        assert_eq!(resolution.was_impostor, None);
        assert_eq!(resolution.outcome, RoundOutcome::Continue);
        assert!(engine.eliminated_players().is_empty());
        assert_eq!(engine.current_round(), 2);
    }

    #[test]
    fn test_no_votes_eliminates_nobody() {
        let mut engine = started(3, 1, 2);
        play_round(&mut engine);
        engine.begin_voting().unwrap();

        let resolution = engine.close_voting().unwrap();
        assert_eq!(resolution.verdict, Verdict::NoVotes);
        assert!(resolution.vote_counts.is_empty());
        assert_eq!(resolution.outcome, RoundOutcome::Continue);
    }

    #[test]
    fn test_revote_and_out_of_range_vote() {
        let mut engine = started(3, 1, 2);
        play_round(&mut engine);
        engine.begin_voting().unwrap();

        assert!(engine.register_vote(7, 2).unwrap());
        assert!(!engine.register_vote(7, 3).unwrap());
        assert_eq!(engine.votes().get(&7), Some(&2));

        assert!(engine.register_vote(7, 1).unwrap());
        assert_eq!(engine.votes().get(&7), Some(&1));
        assert_eq!(engine.votes().len(), 1);
    }

    #[test]
    fn test_votes_reset_each_ballot() {
        let mut engine = started(4, 1, 3);
        play_round(&mut engine);
        engine.begin_voting().unwrap();
        engine.register_vote(1, 0).unwrap();
        engine.register_vote(2, 1).unwrap();
        engine.close_voting().unwrap();

        play_round(&mut engine);
        engine.begin_voting().unwrap();
        assert!(engine.votes().is_empty());
    }

    #[test]
    fn test_catching_last_impostor_wins_for_citizens() {
        let mut engine = started(6, 2, 5);

        for round in 1..=2 {
            play_round(&mut engine);
            engine.begin_voting().unwrap();
            let impostor = first_impostor(&engine);
            let index = index_of(&engine, impostor);
            engine.register_vote(1, index).unwrap();

            let resolution = engine.close_voting().unwrap();
            assert_eq!(resolution.eliminated_player, Some(impostor));
            assert_eq!(resolution.was_impostor, Some(true));

            if round == 1 {
                assert_eq!(resolution.impostors_left, 1);
                assert_eq!(resolution.outcome, RoundOutcome::Continue);
            } else {
                assert_eq!(
                    resolution.outcome,
                    RoundOutcome::GameOver(GameOutcome {
                        winner: Team::Citizens,
                        reason: GameOverReason::AllImpostorsCaught,
                    })
                );
            }
        }

        assert_eq!(engine.phase(), Phase::Finished);
        assert!(engine.impostors().is_empty());
        assert_eq!(engine.eliminated_players().len(), 2);
        assert_eq!(engine.current_round(), 2);
    }

    #[test]
    fn test_impostors_win_when_rounds_run_out() {
        let mut engine = started(4, 1, 2);

        // Round 1: a citizen is voted out
        play_round(&mut engine);
        engine.begin_voting().unwrap();
        let citizen = first_citizen(&engine);
        engine
            .register_vote(1, index_of(&engine, citizen))
            .unwrap();
        let resolution = engine.close_voting().unwrap();
        assert_eq!(resolution.was_impostor, Some(false));
        assert_eq!(resolution.outcome, RoundOutcome::Continue);
        assert!(!engine.citizens().contains(&citizen));
        assert_eq!(engine.citizens().len(), 2);

        // Round 2: a tie on the last round
        play_round(&mut engine);
        engine.begin_voting().unwrap();
        engine.register_vote(1, 0).unwrap();
        engine.register_vote(2, 1).unwrap();
        let resolution = engine.close_voting().unwrap();

        assert_eq!(
            resolution.outcome,
            RoundOutcome::GameOver(GameOutcome {
                winner: Team::Impostors,
                reason: GameOverReason::RoundsExhausted,
            })
        );
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.current_round(), 2);
    }

    #[test]
    fn test_round_limit_guard() {
        let mut engine = started(3, 1, 2);
        engine.phase = Phase::ProcessingVotes;
        engine.current_round = 2;

        assert!(matches!(
            engine.start_new_round(),
            Err(GameError::RoundLimitExceeded { max_rounds: 2 })
        ));
        assert_eq!(engine.current_round(), 2);
    }

    #[test]
    fn test_advance_skips_player_eliminated_mid_round() {
        let mut engine = started(4, 1, 3);
        let order = engine.turn_order().to_vec();

        engine.submit_clue(order[0], "something yellow").unwrap();
        assert_eq!(engine.current_player(), Some(order[1]));
        engine.eliminated.push(order[2]);

        let advance = engine.submit_clue(order[1], "tropical").unwrap();
        assert_eq!(advance, ClueOutcome::Accepted(TurnAdvance::Next(order[3])));

        let advance = engine.submit_clue(order[3], "spiky").unwrap();
        assert!(matches!(
            advance,
            ClueOutcome::Accepted(TurnAdvance::RoundComplete { round: 1, .. })
        ));
        assert_eq!(engine.phase(), Phase::Discussing);
        assert!(engine.all_players_played());
        assert_eq!(engine.round_clues(1).len(), 3);
    }

    #[test]
    fn test_empty_turn_order_ends_game() {
        let mut engine = started(3, 1, 3);
        play_round(&mut engine);
        engine.eliminated = engine.turn_order().to_vec();
        engine.phase = Phase::ProcessingVotes;
        engine.drain_intents();

        engine.start_new_round().unwrap();

        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.current_player(), None);
        assert_eq!(
            engine.outcome(),
            Some(GameOutcome {
                winner: Team::Impostors,
                reason: GameOverReason::NoActivePlayers,
            })
        );
        assert!(matches!(
            engine.drain_intents().last(),
            Some(Intent::AnnounceGameOver(_))
        ));
    }

    #[test]
    fn test_start_new_round_requires_started_game() {
        let mut engine = lobby(3);
        assert!(matches!(
            engine.start_new_round(),
            Err(GameError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_late_phase_calls_are_harmless() {
        let mut engine = started(3, 1, 3);
        play_round(&mut engine);
        engine.begin_voting().unwrap();
        engine.register_vote(1, 0).unwrap();

        // A discussion timer firing after voting already began
        assert!(matches!(
            engine.begin_voting(),
            Err(GameError::WrongPhase { .. })
        ));
        assert_eq!(engine.votes().len(), 1);
        assert_eq!(engine.phase(), Phase::Voting);
    }

    #[test]
    fn test_delivery_failures_are_reported() {
        let mut engine = lobby(3);
        engine.report_delivery_failures(&[1]);
        assert!(engine.status().delivery_failures.is_empty());

        engine.configure(1, 2).unwrap();
        engine.assign_roles_and_start().unwrap();
        engine.drain_intents();

        engine.report_delivery_failures(&[2, 2, 404]);
        assert_eq!(
            engine.drain_intents(),
            vec![Intent::ReportRoleDelivery {
                delivered: 2,
                total: 3,
                failed: vec!["P2".to_string()],
            }]
        );
        assert_eq!(engine.status().delivery_failures, vec!["P2".to_string()]);
    }

    #[test]
    fn test_status_snapshot() {
        let mut engine = started(4, 1, 3);
        let order = engine.turn_order().to_vec();
        engine.submit_clue(order[0], "first").unwrap();

        let status = engine.status();
        assert_eq!(status.phase, Phase::PlayingRound);
        assert_eq!(status.round, 1);
        assert_eq!(status.max_rounds, Some(3));
        assert_eq!(status.players, 4);
        assert_eq!(status.active_players.len(), 4);
        assert_eq!(status.current_player, Some(format!("P{}", order[1])));
        assert_eq!(status.clues.len(), 1);
        assert!(status.outcome.is_none());
    }

    #[test]
    fn test_cancel_closes_open_poll() {
        let mut engine = lobby(2);
        engine.drain_intents();

        let intents = engine.cancel(CancelReason::NotEnoughPlayers);
        assert_eq!(
            intents,
            vec![
                Intent::ClosePoll {
                    kind: PollKind::Join
                },
                Intent::AnnounceCancelled {
                    reason: CancelReason::NotEnoughPlayers,
                    joined: 2,
                },
            ]
        );
    }

    #[test]
    fn test_poll_tokens() {
        let mut engine = lobby(3);
        assert_eq!(engine.poll(PollKind::Join), None);
        engine.attach_poll(PollKind::Join, 11);
        engine.attach_poll(PollKind::Vote, 12);
        assert_eq!(engine.poll(PollKind::Join), Some(11));
        assert_eq!(engine.poll(PollKind::Vote), Some(12));
    }
}
