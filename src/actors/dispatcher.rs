use actix::{Actor, ActorFutureExt, Addr, AsyncContext, Context, Handler, WrapFuture};
use ::serenity::http::HttpError;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::actors::session_store::{Dispatch, Outbound, ReportDeliveryFailures, SessionStoreActor};
use crate::discord::action_rows;
use crate::game::{Intent, PollId, RoleDelivery, SessionId};
use crate::render::{self, Rendered};

/// Messages posted for one session that may be edited later
#[derive(Debug, Default)]
struct SessionBoard {
    roster: Option<serenity::MessageId>,
    polls: HashMap<PollId, serenity::MessageId>,
    closed: bool,
}

/// Actor that performs the Discord side of intents
pub struct IntentDispatcherActor {
    discord_ctx: Arc<serenity::Context>,
    session_store: Addr<SessionStoreActor>,
    role_reveal_delay: Duration,
    boards: HashMap<SessionId, SessionBoard>,
}

impl IntentDispatcherActor {
    pub fn new(
        discord_ctx: Arc<serenity::Context>,
        session_store: Addr<SessionStoreActor>,
        role_reveal_delay: Duration,
    ) -> Self {
        Self {
            discord_ctx,
            session_store,
            role_reveal_delay,
            boards: HashMap::new(),
        }
    }
}

impl Actor for IntentDispatcherActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!("IntentDispatcherActor started");
    }
}

impl Handler<Dispatch> for IntentDispatcherActor {
    type Result = ();

    fn handle(&mut self, msg: Dispatch, ctx: &mut Context<Self>) -> Self::Result {
        let session = msg.session_id;
        let mut board = self.boards.remove(&session).unwrap_or_default();
        let delivery = Delivery {
            discord: self.discord_ctx.clone(),
            store: self.session_store.clone(),
            session,
            channel: serenity::ChannelId::new(session),
            role_reveal_delay: self.role_reveal_delay,
        };
        debug!(
            "Dispatching {} intent(s) for session {}",
            msg.items.len(),
            session
        );

        // Waiting keeps later batches queued until this one is on screen
        ctx.wait(
            async move {
                for item in msg.items {
                    delivery.perform(item, &mut board).await;
                }
                board
            }
            .into_actor(self)
            .map(move |board, actor, _ctx| {
                if board.closed {
                    debug!("Session {} is over, forgetting its messages", session);
                } else {
                    actor.boards.insert(session, board);
                }
            }),
        );
    }
}

/// Everything one batch needs, detached from the actor
struct Delivery {
    discord: Arc<serenity::Context>,
    store: Addr<SessionStoreActor>,
    session: SessionId,
    channel: serenity::ChannelId,
    role_reveal_delay: Duration,
}

impl Delivery {
    async fn perform(&self, item: Outbound, board: &mut SessionBoard) {
        let Outbound { intent, poll_id } = item;

        match &intent {
            Intent::ShowRoster { .. } => {
                if let Some(rendered) = render::render(&intent, None) {
                    self.show_roster(&rendered, board).await;
                }
            }
            Intent::ClosePoll { kind } => match poll_id {
                Some(poll) => self.close_poll(poll, board).await,
                None => debug!("No {:?} poll to close in session {}", kind, self.session),
            },
            Intent::SendRoles { deliveries } => self.send_roles(deliveries).await,
            _ => {
                let Some(rendered) = render::render(&intent, poll_id) else {
                    return;
                };
                let posted = self.post(&rendered).await;

                if let (Intent::OpenPoll { .. }, Some(poll), Some(message_id)) =
                    (&intent, poll_id, posted)
                {
                    board.polls.insert(poll, message_id);
                }
                if matches!(
                    intent,
                    Intent::AnnounceGameOver(_) | Intent::AnnounceCancelled { .. }
                ) {
                    board.closed = true;
                }
            }
        }
    }

    async fn post(&self, rendered: &Rendered) -> Option<serenity::MessageId> {
        let message = serenity::CreateMessage::new()
            .content(&rendered.content)
            .components(action_rows(&rendered.rows));

        match self
            .channel
            .send_message(&*self.discord, message)
            .await
        {
            Ok(message) => Some(message.id),
            Err(e) => {
                if is_forbidden(&e) {
                    warn!(
                        "Not allowed to post in channel {}, check the bot's channel permissions",
                        self.channel
                    );
                } else {
                    error!("Failed to post to channel {}: {}", self.channel, e);
                }
                None
            }
        }
    }

    /// Keep a single roster message per lobby, editing it as players come and go
    async fn show_roster(&self, rendered: &Rendered, board: &mut SessionBoard) {
        if let Some(message_id) = board.roster {
            let edit = serenity::EditMessage::new().content(&rendered.content);
            match self
                .channel
                .edit_message(&*self.discord, message_id, edit)
                .await
            {
                Ok(_) => return,
                Err(e) => warn!(
                    "Could not edit roster message {}, posting a new one: {}",
                    message_id, e
                ),
            }
        }
        board.roster = self.post(rendered).await;
    }

    /// Strip the buttons off a poll message
    async fn close_poll(&self, poll: PollId, board: &mut SessionBoard) {
        let Some(message_id) = board.polls.remove(&poll) else {
            debug!("Poll {} has no message to close", poll);
            return;
        };

        let edit = serenity::EditMessage::new().components(Vec::new());
        if let Err(e) = self
            .channel
            .edit_message(&*self.discord, message_id, edit)
            .await
        {
            warn!("Failed to close poll {} (message {}): {}", poll, message_id, e);
        }
    }

    /// DM every player their role, tell the store who could not be reached,
    /// then give everyone a moment to read before the first turn shows up
    async fn send_roles(&self, deliveries: &[RoleDelivery]) {
        let mut failed = Vec::new();
        for delivery in deliveries {
            let user = serenity::UserId::new(delivery.player.id);
            let message =
                serenity::CreateMessage::new().content(render::role_message(&delivery.payload));

            if let Err(e) = user.direct_message(&*self.discord, message).await {
                warn!(
                    "Could not send role to {} ({}): {}",
                    delivery.player.name, delivery.player.id, e
                );
                failed.push(delivery.player.id);
            }
        }
        info!(
            "Delivered {}/{} roles for session {}",
            deliveries.len() - failed.len(),
            deliveries.len(),
            self.session
        );

        let report = ReportDeliveryFailures {
            session: self.session,
            failed,
        };
        match self.store.send(report).await {
            Ok(items) => {
                for item in items {
                    if let Some(rendered) = render::render(&item.intent, item.poll_id) {
                        self.post(&rendered).await;
                    }
                }
            }
            Err(e) => error!("Failed to report role delivery: {}", e),
        }

        actix_rt::time::sleep(self.role_reveal_delay).await;
    }
}

/// Discord refused the request for lack of access or permissions
fn is_forbidden(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403
    )
}
