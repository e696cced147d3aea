use poise::serenity_prelude as serenity;
use std::borrow::Borrow;
use tracing::{debug, info, warn};

use crate::actors::session_store::{
    Configure, EndDiscussion, EndVoting, PollAnswer, RequestConfiguration, SubmitClue,
};
use crate::discord::custom_id::ComponentAction;
use crate::discord::{action_rows, ask, display_name, is_admin};
use crate::error::{GameError, SessionError};
use crate::game::{ClueOutcome, PlayerId};
use crate::render::{self, Rendered};
use crate::{Data, Error};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => on_message(ctx, new_message, data).await,
        serenity::FullEvent::InteractionCreate { interaction } => match interaction {
            serenity::Interaction::Component(component) => {
                on_component(ctx, component, data).await
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Messages in a channel with a running round are clues
async fn on_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    // Skip bots, including ourselves, and direct messages
    if message.author.bot || message.guild_id.is_none() {
        return Ok(());
    }

    let text = message.content.trim();
    if text.is_empty() {
        return Ok(());
    }

    let clue = SubmitClue {
        session: message.channel_id.get(),
        player: message.author.id.get(),
        text: text.to_string(),
    };
    match ask(&data.session_store, clue).await? {
        Ok(ClueOutcome::Accepted(_)) => {
            debug!("Clue from {} accepted", message.author.name)
        }
        Ok(ClueOutcome::Leaked(_)) => {
            info!(
                "{} leaked the secret word in channel {}",
                message.author.name, message.channel_id
            )
        }
        Err(SessionError::Game(GameError::NotYourTurn { current })) => {
            reject_off_turn(ctx, message, current).await
        }
        // Ordinary chat outside of a round
        Err(SessionError::NoActiveGame) | Err(SessionError::Game(GameError::WrongPhase { .. })) => {}
        Err(e) => debug!(
            "Message from {} not taken as a clue: {}",
            message.author.name, e
        ),
    }
    Ok(())
}

/// Remove a message sent out of turn and tell the sender to wait
async fn reject_off_turn(
    ctx: &serenity::Context,
    message: &serenity::Message,
    current: Option<PlayerId>,
) {
    if let Err(e) = message.delete(ctx).await {
        warn!("Could not delete off-turn message {}: {}", message.id, e);
    }

    let warning = match current {
        Some(current) => format!(
            "<@{}>, it's <@{}>'s turn. Please wait for yours.",
            message.author.id, current
        ),
        None => format!("<@{}>, it's not your turn.", message.author.id),
    };
    if let Err(e) = message.channel_id.say(ctx, warning).await {
        warn!("Could not warn {}: {}", message.author.name, e);
    }
}

async fn on_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(action) = ComponentAction::parse(&component.data.custom_id) else {
        debug!("Ignoring component '{}'", component.data.custom_id);
        return Ok(());
    };

    let member = member_of(&component.member);
    if action.admin_only() && !is_admin(member) {
        return respond(
            ctx,
            component,
            Rendered::text("Only server managers can do that."),
        )
        .await;
    }

    let session = component.channel_id.get();
    let store = &data.session_store;
    debug!("{:?} pressed by {}", action, component.user.name);

    let response = match action {
        ComponentAction::PollAnswer { poll, option } => {
            let answer = PollAnswer {
                poll_id: poll,
                voter: component.user.id.get(),
                name: display_name(&component.user, member),
                option,
            };
            match ask(store, answer).await? {
                Ok(true) => Rendered::text("✅ Your answer was recorded."),
                Ok(false) => Rendered::text("Nothing changed."),
                Err(SessionError::NoActiveGame) => Rendered::text("This poll is closed."),
                Err(e) => Rendered::text(e.to_string()),
            }
        }
        ComponentAction::Continue => {
            match ask(store, RequestConfiguration { session }).await? {
                Ok(()) => Rendered::text("Choose the settings in the channel."),
                Err(e) => Rendered::text(e.to_string()),
            }
        }
        ComponentAction::ChooseImpostors(impostors) => render::round_menu(impostors),
        ComponentAction::ChooseRounds { impostors, rounds } => {
            let configure = Configure {
                session,
                impostors,
                rounds,
            };
            match ask(store, configure).await? {
                Ok(()) => Rendered::text(format!(
                    "Starting with {} impostor(s) and {} rounds.",
                    impostors, rounds
                )),
                Err(e) => Rendered::text(e.to_string()),
            }
        }
        ComponentAction::StartVoting => match ask(store, EndDiscussion { session }).await? {
            Ok(_) => Rendered::text("Voting is open."),
            Err(e) => Rendered::text(e.to_string()),
        },
        ComponentAction::EndVoting => match ask(store, EndVoting { session }).await? {
            Ok(_) => Rendered::text("Voting closed."),
            Err(e) => Rendered::text(e.to_string()),
        },
    };

    respond(ctx, component, response).await
}

/// Works whether or not the payload boxes the member
fn member_of<M: Borrow<serenity::Member>>(member: &Option<M>) -> Option<&serenity::Member> {
    member.as_ref().map(Borrow::borrow)
}

/// Answer a button press with a message only the presser sees
async fn respond(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    rendered: Rendered,
) -> Result<(), Error> {
    let message = serenity::CreateInteractionResponseMessage::new()
        .content(rendered.content)
        .components(action_rows(&rendered.rows))
        .ephemeral(true);

    component
        .create_response(ctx, serenity::CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}
