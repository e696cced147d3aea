use actix::{Actor, AsyncContext, Context, Handler, Message, Recipient};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::actors::poll_index::PollIndex;
use crate::config::Config;
use crate::error::{GameError, SessionError};
use crate::game::{
    CancelReason, ClueOutcome, GameEngine, GameSettings, Intent, Phase, PlayerId, PollId,
    PollKind, SessionId, StatusSnapshot, TurnAdvance, VoteResolution, MIN_PLAYERS,
};
use crate::words::WordBank;

/// An intent with the poll id it refers to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub intent: Intent,
    pub poll_id: Option<PollId>,
}

/// Intents of one session, to be performed in order
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Dispatch {
    pub session_id: SessionId,
    pub items: Vec<Outbound>,
}

/// Message to open a new game in a channel
#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct OpenGame {
    pub session: SessionId,
}

/// Message carrying an answer to one of our polls. Join polls: option 0
/// joins, any other option leaves. Vote polls: the option is the ballot index.
#[derive(Message)]
#[rtype(result = "Result<bool, SessionError>")]
pub struct PollAnswer {
    pub poll_id: PollId,
    pub voter: PlayerId,
    pub name: String,
    pub option: usize,
}

/// Message to close the lobby and show the settings menu
#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct RequestConfiguration {
    pub session: SessionId,
}

/// Message to apply settings and start the game
#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct Configure {
    pub session: SessionId,
    pub impostors: usize,
    pub rounds: u32,
}

#[derive(Message)]
#[rtype(result = "Result<ClueOutcome, SessionError>")]
pub struct SubmitClue {
    pub session: SessionId,
    pub player: PlayerId,
    pub text: String,
}

#[derive(Message)]
#[rtype(result = "Result<TurnAdvance, SessionError>")]
pub struct SkipTurn {
    pub session: SessionId,
    pub requester: PlayerId,
    pub privileged: bool,
}

/// Message to end the discussion and open the vote
#[derive(Message)]
#[rtype(result = "Result<Vec<String>, SessionError>")]
pub struct EndDiscussion {
    pub session: SessionId,
}

#[derive(Message)]
#[rtype(result = "Result<VoteResolution, SessionError>")]
pub struct EndVoting {
    pub session: SessionId,
}

#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct CancelGame {
    pub session: SessionId,
}

#[derive(Message)]
#[rtype(result = "Result<StatusSnapshot, SessionError>")]
pub struct GetStatus {
    pub session: SessionId,
}

/// Message from the dispatcher listing players whose role message bounced.
/// Replies with the intents to render right away.
#[derive(Message)]
#[rtype(result = "Vec<Outbound>")]
pub struct ReportDeliveryFailures {
    pub session: SessionId,
    pub failed: Vec<PlayerId>,
}

/// Message to set where drained intents are sent
#[derive(Message)]
#[rtype(result = "()")]
pub struct AttachDispatcher(pub Recipient<Dispatch>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    JoinWindow,
    Discussion,
    Voting,
}

impl TimerKind {
    fn applies_to(self, phase: Phase) -> bool {
        match self {
            TimerKind::JoinWindow => {
                matches!(phase, Phase::WaitingForPlayers | Phase::RoleAssignment)
            }
            TimerKind::Discussion => phase == Phase::Discussing,
            TimerKind::Voting => phase == Phase::Voting,
        }
    }
}

/// Phase window expiry (internal). Ignored unless the session, round and
/// phase it was armed for are still current.
#[derive(Message)]
#[rtype(result = "()")]
struct PhaseTimerElapsed {
    session: SessionId,
    serial: u64,
    round: u32,
    kind: TimerKind,
}

/// Phase windows and the settings used when nobody configures the game
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub join_window: Duration,
    pub discussion: Duration,
    pub voting: Duration,
    pub default_settings: GameSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            join_window: Duration::from_secs(180),
            discussion: Duration::from_secs(180),
            voting: Duration::from_secs(30),
            default_settings: GameSettings::default(),
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            join_window: config.join_window,
            discussion: config.discussion,
            voting: config.voting,
            default_settings: config.default_settings,
        }
    }
}

struct SessionSlot {
    engine: GameEngine,
    /// Distinguishes consecutive games in the same channel
    serial: u64,
}

/// Actor owning every running game. All events for all sessions go through
/// its mailbox, so each engine sees one operation at a time.
pub struct SessionStoreActor {
    words: Arc<WordBank>,
    options: SessionOptions,
    sessions: HashMap<SessionId, SessionSlot>,
    polls: PollIndex,
    last_serial: u64,
    dispatcher: Option<Recipient<Dispatch>>,
}

impl SessionStoreActor {
    pub fn new(words: Arc<WordBank>, options: SessionOptions) -> Self {
        Self {
            words,
            options,
            sessions: HashMap::new(),
            polls: PollIndex::new(),
            last_serial: 0,
            dispatcher: None,
        }
    }

    /// Run one engine operation and forward whatever it emitted
    fn with_session<T>(
        &mut self,
        session: SessionId,
        ctx: &mut Context<Self>,
        op: impl FnOnce(&mut GameEngine) -> Result<T, GameError>,
    ) -> Result<T, SessionError> {
        let slot = self
            .sessions
            .get_mut(&session)
            .ok_or(SessionError::NoActiveGame)?;
        let result = op(&mut slot.engine);
        self.flush(session, ctx);

        if let Err(GameError::RoundLimitExceeded { max_rounds }) = &result {
            error!(
                "Session {} went past its {} rounds, dropping it",
                session, max_rounds
            );
            self.drop_session(session);
        }
        result.map_err(SessionError::from)
    }

    fn flush(&mut self, session: SessionId, ctx: &mut Context<Self>) {
        let items = self.collect(session, ctx);
        self.forward(session, items);
    }

    /// Drain the engine's intents, tag polls with ids and arm phase timers.
    /// Finished sessions are dropped afterwards.
    fn collect(&mut self, session: SessionId, ctx: &mut Context<Self>) -> Vec<Outbound> {
        let Some(slot) = self.sessions.get_mut(&session) else {
            return Vec::new();
        };
        let serial = slot.serial;
        let mut items = Vec::new();

        for intent in slot.engine.drain_intents() {
            let poll_id = match &intent {
                Intent::OpenPoll { kind, .. } => {
                    let poll = self.polls.register(session, *kind);
                    slot.engine.attach_poll(*kind, poll);
                    Some(poll)
                }
                Intent::ClosePoll { kind } => {
                    let poll = slot.engine.poll(*kind);
                    if let Some(poll) = poll {
                        self.polls.remove(poll);
                    }
                    poll
                }
                _ => None,
            };

            let timer = match &intent {
                Intent::OpenPoll {
                    kind: PollKind::Join,
                    ..
                } => Some((TimerKind::JoinWindow, self.options.join_window)),
                Intent::StartDiscussion { .. } => {
                    Some((TimerKind::Discussion, self.options.discussion))
                }
                Intent::OpenPoll {
                    kind: PollKind::Vote,
                    ..
                } => Some((TimerKind::Voting, self.options.voting)),
                _ => None,
            };
            if let Some((kind, delay)) = timer {
                debug!(
                    "Arming {:?} timer for session {} ({:?})",
                    kind, session, delay
                );
                ctx.notify_later(
                    PhaseTimerElapsed {
                        session,
                        serial,
                        round: slot.engine.current_round(),
                        kind,
                    },
                    delay,
                );
            }

            items.push(Outbound { intent, poll_id });
        }

        if slot.engine.phase() == Phase::Finished {
            self.drop_session(session);
        }
        items
    }

    fn forward(&self, session: SessionId, items: Vec<Outbound>) {
        if items.is_empty() {
            return;
        }
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.do_send(Dispatch {
                session_id: session,
                items,
            }),
            None => warn!(
                "No dispatcher attached, dropping {} intents for session {}",
                items.len(),
                session
            ),
        }
    }

    fn drop_session(&mut self, session: SessionId) {
        if self.sessions.remove(&session).is_some() {
            let polls = self.polls.remove_session(session);
            info!(
                "Session {} closed, {} open poll(s) forgotten",
                session, polls
            );
        }
    }

    fn cancel_session(
        &mut self,
        session: SessionId,
        reason: CancelReason,
    ) -> Result<(), SessionError> {
        let slot = self
            .sessions
            .remove(&session)
            .ok_or(SessionError::NoActiveGame)?;
        self.polls.remove_session(session);

        let join = slot.engine.poll(PollKind::Join);
        let vote = slot.engine.poll(PollKind::Vote);
        let items = slot
            .engine
            .cancel(reason)
            .into_iter()
            .map(|intent| {
                let poll_id = match &intent {
                    Intent::ClosePoll {
                        kind: PollKind::Join,
                    } => join,
                    Intent::ClosePoll {
                        kind: PollKind::Vote,
                    } => vote,
                    _ => None,
                };
                Outbound { intent, poll_id }
            })
            .collect();

        self.forward(session, items);
        Ok(())
    }

    /// Start with default settings if enough players joined, otherwise give up
    fn expire_join_window(
        &mut self,
        session: SessionId,
        ctx: &mut Context<Self>,
    ) -> Result<(), SessionError> {
        let joined = self
            .sessions
            .get(&session)
            .map(|slot| slot.engine.roster().len())
            .ok_or(SessionError::NoActiveGame)?;

        if joined < MIN_PLAYERS {
            info!(
                "Join window of session {} closed with {} player(s)",
                session, joined
            );
            return self.cancel_session(session, CancelReason::NotEnoughPlayers);
        }

        let settings = self.options.default_settings.clamped_for(joined);
        info!(
            "Join window of session {} closed, starting with {:?}",
            session, settings
        );
        self.with_session(session, ctx, |engine| {
            engine.configure(settings.impostor_count, settings.max_rounds)?;
            engine.assign_roles_and_start()
        })
    }
}

impl Actor for SessionStoreActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!(
            "SessionStoreActor started with {} words available",
            self.words.len()
        );
    }
}

impl Handler<AttachDispatcher> for SessionStoreActor {
    type Result = ();

    fn handle(&mut self, msg: AttachDispatcher, _ctx: &mut Context<Self>) -> Self::Result {
        info!("Dispatcher attached to session store");
        self.dispatcher = Some(msg.0);
    }
}

impl Handler<OpenGame> for SessionStoreActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: OpenGame, ctx: &mut Context<Self>) -> Self::Result {
        if self.sessions.contains_key(&msg.session) {
            return Err(SessionError::SessionExists);
        }

        self.last_serial += 1;
        let engine = GameEngine::new(msg.session, self.words.clone());
        self.sessions.insert(
            msg.session,
            SessionSlot {
                engine,
                serial: self.last_serial,
            },
        );
        self.flush(msg.session, ctx);
        Ok(())
    }
}

impl Handler<PollAnswer> for SessionStoreActor {
    type Result = Result<bool, SessionError>;

    fn handle(&mut self, msg: PollAnswer, ctx: &mut Context<Self>) -> Self::Result {
        let PollAnswer {
            poll_id,
            voter,
            name,
            option,
        } = msg;
        let Some((session, kind)) = self.polls.resolve(poll_id) else {
            debug!("Answer from {} to unknown poll {}", voter, poll_id);
            return Err(SessionError::NoActiveGame);
        };

        match kind {
            PollKind::Join => self.with_session(session, ctx, |engine| {
                Ok(match option {
                    0 => engine.add_player(voter, name),
                    _ => engine.remove_player(voter),
                })
            }),
            PollKind::Vote => {
                self.with_session(session, ctx, |engine| engine.register_vote(voter, option))
            }
        }
    }
}

impl Handler<RequestConfiguration> for SessionStoreActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: RequestConfiguration, ctx: &mut Context<Self>) -> Self::Result {
        self.with_session(msg.session, ctx, |engine| engine.request_configuration())
    }
}

impl Handler<Configure> for SessionStoreActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: Configure, ctx: &mut Context<Self>) -> Self::Result {
        self.with_session(msg.session, ctx, |engine| {
            engine.configure(msg.impostors, msg.rounds)?;
            engine.assign_roles_and_start()
        })
    }
}

impl Handler<SubmitClue> for SessionStoreActor {
    type Result = Result<ClueOutcome, SessionError>;

    fn handle(&mut self, msg: SubmitClue, ctx: &mut Context<Self>) -> Self::Result {
        self.with_session(msg.session, ctx, |engine| {
            engine.submit_clue(msg.player, &msg.text)
        })
    }
}

impl Handler<SkipTurn> for SessionStoreActor {
    type Result = Result<TurnAdvance, SessionError>;

    fn handle(&mut self, msg: SkipTurn, ctx: &mut Context<Self>) -> Self::Result {
        self.with_session(msg.session, ctx, |engine| {
            engine.skip_turn(msg.requester, msg.privileged)
        })
    }
}

impl Handler<EndDiscussion> for SessionStoreActor {
    type Result = Result<Vec<String>, SessionError>;

    fn handle(&mut self, msg: EndDiscussion, ctx: &mut Context<Self>) -> Self::Result {
        self.with_session(msg.session, ctx, |engine| engine.begin_voting())
    }
}

impl Handler<EndVoting> for SessionStoreActor {
    type Result = Result<VoteResolution, SessionError>;

    fn handle(&mut self, msg: EndVoting, ctx: &mut Context<Self>) -> Self::Result {
        self.with_session(msg.session, ctx, |engine| engine.close_voting())
    }
}

impl Handler<CancelGame> for SessionStoreActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: CancelGame, _ctx: &mut Context<Self>) -> Self::Result {
        self.cancel_session(msg.session, CancelReason::Requested)
    }
}

impl Handler<GetStatus> for SessionStoreActor {
    type Result = Result<StatusSnapshot, SessionError>;

    fn handle(&mut self, msg: GetStatus, _ctx: &mut Context<Self>) -> Self::Result {
        self.sessions
            .get(&msg.session)
            .map(|slot| slot.engine.status())
            .ok_or(SessionError::NoActiveGame)
    }
}

impl Handler<ReportDeliveryFailures> for SessionStoreActor {
    type Result = Vec<Outbound>;

    fn handle(&mut self, msg: ReportDeliveryFailures, ctx: &mut Context<Self>) -> Self::Result {
        let Some(slot) = self.sessions.get_mut(&msg.session) else {
            debug!(
                "Delivery report for closed session {} dropped",
                msg.session
            );
            return Vec::new();
        };
        slot.engine.report_delivery_failures(&msg.failed);
        self.collect(msg.session, ctx)
    }
}

impl Handler<PhaseTimerElapsed> for SessionStoreActor {
    type Result = ();

    fn handle(&mut self, msg: PhaseTimerElapsed, ctx: &mut Context<Self>) -> Self::Result {
        let current = self.sessions.get(&msg.session).is_some_and(|slot| {
            slot.serial == msg.serial
                && slot.engine.current_round() == msg.round
                && msg.kind.applies_to(slot.engine.phase())
        });
        if !current {
            debug!(
                "Ignoring stale {:?} timer for session {}",
                msg.kind, msg.session
            );
            return;
        }

        info!("{:?} window of session {} elapsed", msg.kind, msg.session);
        let result = match msg.kind {
            TimerKind::JoinWindow => self.expire_join_window(msg.session, ctx),
            TimerKind::Discussion => self
                .with_session(msg.session, ctx, |engine| engine.begin_voting())
                .map(|_| ()),
            TimerKind::Voting => self
                .with_session(msg.session, ctx, |engine| engine.close_voting())
                .map(|_| ()),
        };

        if let Err(e) = result {
            warn!(
                "{:?} timer for session {} failed: {}",
                msg.kind, msg.session, e
            );
        }
    }
}
