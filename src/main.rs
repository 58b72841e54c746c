// This is the entry point of the fitness points bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic ledger, cooldowns, awards)
// - `infra/` = Implementations of core traits (SQLite and in-memory stores)
// - `discord/` = Discord-specific adapters (commands, events, audit channel)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::points::{PointsRules, PointsService};
use crate::discord::audit::DiscordAuditSink;
use crate::discord::commands::presence;
use crate::discord::{checkins, error_handler, Data, Error};
use crate::infra::points::SqlitePointsStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const DEFAULT_DATABASE_PATH: &str = "data/points.db";

/// Event handler for non-command Discord events.
/// Messages are checked for passive check-ins here.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // Ignore bot messages (including our own)
        if new_message.author.bot {
            return Ok(());
        }

        match checkins::handle_message(ctx, new_message, data).await {
            Ok(0) => {
                // Not a check-in, or everything matched is on cooldown
            }
            Ok(claimed) => {
                tracing::debug!(
                    message_id = new_message.id.get(),
                    claimed,
                    "Check-in processed"
                );
            }
            Err(e) => {
                // Don't crash the event loop, and don't answer in the channel
                tracing::error!("Error processing check-in: {}", e);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let database_path = std::env::var("POINTS_DATABASE_PATH")
        .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());

    let dev_guild_id = std::env::var("DEV_GUILD_ID")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let points_store = SqlitePointsStore::new(&database_path)
        .await
        .expect("Failed to initialize SQLite points store");
    tracing::info!("Points ledger opened at {}", database_path);

    // The audit sink only needs REST access, so it gets its own HTTP client
    // instead of waiting for the gateway context.
    let audit_http = Arc::new(serenity::Http::new(&token));
    let points_service = Arc::new(
        PointsService::new(points_store, PointsRules::default())
            .with_audit_sink(Arc::new(DiscordAuditSink::new(audit_http))),
    );

    let data = Data {
        points: Arc::clone(&points_service),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read check-in text
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(error_handler::on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Guild registration propagates instantly; global can take up to an hour.
                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await?;
                        tracing::info!("Commands registered in guild {}", guild_id);
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        tracing::info!("Commands registered globally");
                    }
                }

                presence::on_ready(ctx);
                tracing::info!("Bot is ready!");

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
