use tracing::info;

use crate::actors::session_store::{
    CancelGame, EndDiscussion, EndVoting, GetStatus, OpenGame, SkipTurn,
};
use crate::discord::{ask, is_admin, Context};
use crate::error::{GameError, SessionError};
use crate::game::TurnAdvance;
use crate::render;
use crate::{Data, Error};

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        start(),
        cancel(),
        end_meet(),
        end_voting(),
        next_player(),
        check_game(),
    ]
}

/// Private reply to whoever ran the command
async fn reply(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

fn session(ctx: Context<'_>) -> u64 {
    ctx.channel_id().get()
}

/// Open a new game of Impostor in this channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn start(ctx: Context<'_>) -> Result<(), Error> {
    info!("/start in channel {} by {}", session(ctx), ctx.author().name);

    match ask(&ctx.data().session_store, OpenGame { session: session(ctx) }).await? {
        Ok(()) => reply(ctx, "Game opened! Players can join with the buttons.").await,
        Err(e) => reply(ctx, e.to_string()).await,
    }
}

/// Cancel the game running in this channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn cancel(ctx: Context<'_>) -> Result<(), Error> {
    info!("/cancel in channel {} by {}", session(ctx), ctx.author().name);

    match ask(&ctx.data().session_store, CancelGame { session: session(ctx) }).await? {
        Ok(()) => reply(ctx, "Game cancelled.").await,
        Err(e) => reply(ctx, e.to_string()).await,
    }
}

/// End the discussion and open the vote
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn end_meet(ctx: Context<'_>) -> Result<(), Error> {
    match ask(&ctx.data().session_store, EndDiscussion { session: session(ctx) }).await? {
        Ok(candidates) => {
            reply(
                ctx,
                format!("Voting is open with {} candidates.", candidates.len()),
            )
            .await
        }
        Err(e) => reply(ctx, e.to_string()).await,
    }
}

/// Close the vote and count the ballots
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn end_voting(ctx: Context<'_>) -> Result<(), Error> {
    match ask(&ctx.data().session_store, EndVoting { session: session(ctx) }).await? {
        Ok(_) => reply(ctx, "Voting closed.").await,
        Err(e) => reply(ctx, e.to_string()).await,
    }
}

/// Pass the current turn without giving a clue
#[poise::command(slash_command, guild_only)]
pub async fn next_player(ctx: Context<'_>) -> Result<(), Error> {
    let privileged = is_admin(ctx.author_member().await.as_deref());
    let msg = SkipTurn {
        session: session(ctx),
        requester: ctx.author().id.get(),
        privileged,
    };

    match ask(&ctx.data().session_store, msg).await? {
        Ok(TurnAdvance::Next(_)) => reply(ctx, "Turn skipped.").await,
        Ok(TurnAdvance::RoundComplete { .. }) => {
            reply(ctx, "Turn skipped, that was the last one this round.").await
        }
        Err(SessionError::Game(GameError::NotYourTurn { .. })) => {
            reply(
                ctx,
                "Only the current player or an admin can skip the turn.",
            )
            .await
        }
        Err(e) => reply(ctx, e.to_string()).await,
    }
}

/// Show the state of the game in this channel
#[poise::command(slash_command, guild_only)]
pub async fn check_game(ctx: Context<'_>) -> Result<(), Error> {
    match ask(&ctx.data().session_store, GetStatus { session: session(ctx) }).await? {
        Ok(snapshot) => reply(ctx, render::status(&snapshot)).await,
        Err(e) => reply(ctx, e.to_string()).await,
    }
}
