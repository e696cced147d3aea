pub mod commands;
pub mod custom_id;
pub mod events;

use actix::{Actor, Addr, Handler, Message};
use miette::IntoDiagnostic;
use poise::serenity_prelude as serenity;
use std::future::Future;
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::{
    actors::{
        session_store::AttachDispatcher, IntentDispatcherActor, SessionOptions, SessionStoreActor,
    },
    config::Config,
    render::{Button, ButtonTone},
    words::WordBank,
    Data, Error,
};

pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Turn rendered button rows into Discord components
pub fn action_rows(rows: &[Vec<Button>]) -> Vec<serenity::CreateActionRow> {
    rows.iter()
        .map(|row| {
            let buttons = row
                .iter()
                .map(|button| {
                    serenity::CreateButton::new(button.action.custom_id())
                        .label(&button.label)
                        .style(match button.tone {
                            ButtonTone::Primary => serenity::ButtonStyle::Primary,
                            ButtonTone::Secondary => serenity::ButtonStyle::Secondary,
                            ButtonTone::Success => serenity::ButtonStyle::Success,
                            ButtonTone::Danger => serenity::ButtonStyle::Danger,
                        })
                })
                .collect();
            serenity::CreateActionRow::Buttons(buttons)
        })
        .collect()
}

/// Send a message to the session store, surfacing mailbox failures as actor errors
pub async fn ask<M>(store: &Addr<SessionStoreActor>, msg: M) -> Result<M::Result, Error>
where
    M: Message + Send + 'static,
    M::Result: Send,
    SessionStoreActor: Handler<M>,
{
    store
        .send(msg)
        .await
        .map_err(|e| Error::Actor(format!("Session store unavailable: {}", e)))
}

/// Whether a guild member may run the game (manage server or administrator)
pub fn is_admin(member: Option<&serenity::Member>) -> bool {
    member.and_then(|m| m.permissions).is_some_and(|permissions| {
        permissions.contains(serenity::Permissions::MANAGE_GUILD)
            || permissions.contains(serenity::Permissions::ADMINISTRATOR)
    })
}

/// Name shown to other players: server nickname, then global name, then username
pub fn display_name(user: &serenity::User, member: Option<&serenity::Member>) -> String {
    member
        .and_then(|m| m.nick.clone())
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone())
}

pub async fn setup_bot(config: Config) -> miette::Result<()> {
    info!("Setting up Discord bot");

    let words = match &config.word_list_path {
        Some(path) => WordBank::from_json_file(path).map_err(Error::WordBank)?,
        None => WordBank::builtin(),
    };
    let words = Arc::new(words);
    let options = SessionOptions::from(&config);
    let role_reveal_delay = config.role_reveal_delay;
    let activity = config.bot_activity.clone();

    // Dropping this sender stops the store's actor system
    let (exit_tx, exit_rx) = oneshot::channel::<()>();
    let store_rx = spawn_actor_system(
        "Session store",
        move || SessionStoreActor::new(words, options),
        async move {
            if exit_rx.await.is_err() {
                info!("Bot stopped, shutting the session store down");
            }
        },
    );
    let session_store = store_rx
        .await
        .map_err(|_| miette::miette!("Session store did not start"))?;

    let options = poise::FrameworkOptions {
        commands: commands::all(),
        event_handler: |ctx, event, framework, data| {
            Box::pin(events::event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |ctx, ready, framework| {
            let activity = activity.clone();
            let session_store = session_store.clone();

            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands)
                    .await
                    .map_err(Error::Discord)?;

                info!("{} is connected!", ready.user.name);
                ctx.set_presence(
                    Some(serenity::ActivityData::playing(&activity)),
                    serenity::OnlineStatus::Online,
                );
                info!("Setting activity to {}", activity);

                // The dispatcher needs a live gateway context, so it starts here
                let ctx = Arc::new(ctx.clone());
                let store = session_store.clone();
                let dispatch_rx = spawn_actor_system(
                    "Intent dispatcher",
                    move || IntentDispatcherActor::new(ctx, store, role_reveal_delay),
                    async {
                        tokio::signal::ctrl_c().await.ok();
                    },
                );
                let dispatcher = dispatch_rx
                    .await
                    .map_err(|_| Error::Actor("Failed to get dispatcher actor address".into()))?;
                session_store.do_send(AttachDispatcher(dispatcher.recipient()));

                info!("Impostor game system initialized successfully");

                Ok(Data { session_store })
            })
        })
        .build();

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .into_diagnostic()?;

    info!("Starting bot...");
    client
        .start()
        .await
        .map_err(Error::Discord)
        .into_diagnostic()?;

    drop(exit_tx);

    Ok(())
}

/// Run an actor on its own actix system thread until `stop` resolves. The
/// address comes back through the returned channel once the actor started.
fn spawn_actor_system<A, F, S>(
    label: &'static str,
    make: F,
    stop: S,
) -> oneshot::Receiver<Addr<A>>
where
    A: Actor<Context = actix::Context<A>>,
    F: FnOnce() -> A + Send + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    thread::spawn(move || {
        let system = actix_rt::System::new();
        system.block_on(async move {
            let local = tokio::task::LocalSet::new();
            local
                .run_until(async move {
                    let addr = make().start();
                    info!("{} actor started", label);
                    if tx.send(addr).is_err() {
                        error!("Nobody is waiting for the {} address", label);
                    }
                    stop.await;
                })
                .await
        });
        info!("{} thread exiting", label);
    });

    rx
}
