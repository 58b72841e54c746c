// Admin commands for per-guild points configuration.
//
// Every subcommand writes a partial update, so setting one value never
// clears another.

use crate::core::points::{Category, ConfigUpdate, MS_PER_HOUR};
use crate::discord::commands::points::CategoryChoice;
use crate::discord::formatter::{category_emoji, format_cooldown, COLOR_INFO};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Configure check-ins, audit logging and cooldowns.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    subcommands("status", "checkins_channel", "audit_channel", "cooldown")
)]
pub async fn setup(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current points configuration.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let points = &ctx.data().points;
    let config = points.get_config(guild_id).await?;

    let channel_mention = |id: Option<u64>| {
        id.map(|id| format!("<#{}>", id))
            .unwrap_or_else(|| "Not set".to_string())
    };

    let mut cooldown_lines = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let duration = points.effective_cooldown(guild_id, category).await?;
        let overridden = config
            .cooldown_overrides_ms
            .get(category)
            .is_some_and(|ms| ms > 0);
        cooldown_lines.push(format!(
            "{} {}: {}{}",
            category_emoji(category),
            category.label(),
            format_cooldown(duration),
            if overridden { " (custom)" } else { "" }
        ));
    }

    let point_lines = points
        .rules()
        .points
        .iter()
        .map(|(category, value)| {
            format!(
                "{} {}: {}",
                category_emoji(category),
                category.label(),
                value
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::default()
        .title("Points Configuration")
        .color(COLOR_INFO)
        .field(
            "Check-ins Channel",
            channel_mention(config.checkins_channel_id),
            true,
        )
        .field("Audit Channel", channel_mention(config.audit_channel_id), true)
        .field("Cooldowns", cooldown_lines.join("\n"), false)
        .field("Points per Claim", point_lines, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Guild ID: {}",
            guild_id
        )))
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Select the channel watched for check-in messages.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn checkins_channel(
    ctx: Context<'_>,
    #[description = "Channel where members post check-ins"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let channel_id = channel.id().get();

    ctx.data()
        .points
        .update_config(guild_id, ConfigUpdate::checkins_channel(channel_id))
        .await?;
    ctx.say(format!("✅ Check-ins channel set to <#{}>.", channel_id))
        .await?;
    Ok(())
}

/// Select the channel that receives award notifications.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn audit_channel(
    ctx: Context<'_>,
    #[description = "Channel for award notifications"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let channel_id = channel.id().get();

    ctx.data()
        .points
        .update_config(guild_id, ConfigUpdate::audit_channel(channel_id))
        .await?;
    ctx.say(format!("✅ Audit channel set to <#{}>.", channel_id))
        .await?;
    Ok(())
}

/// Change how long members wait between claims for an activity.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn cooldown(
    ctx: Context<'_>,
    #[description = "Activity category"] category: CategoryChoice,
    #[description = "Cooldown in hours"]
    #[min = 0]
    #[max = 720]
    hours: u32,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let category = Category::from(category);

    let config = ctx
        .data()
        .points
        .set_cooldown_hours(guild_id, category, hours)
        .await?;

    let reply = if hours == 0 {
        let current = config
            .cooldown_overrides_ms
            .get(category)
            .map(|ms| format!("{} hours", ms / MS_PER_HOUR))
            .unwrap_or_else(|| "the default".to_string());
        format!(
            "A 0-hour cooldown isn't supported; {} stays at {}.",
            category.label(),
            current
        )
    } else {
        format!(
            "✅ {} cooldown set to {} hour{}.",
            category.label(),
            hours,
            if hours == 1 { "" } else { "s" }
        )
    };

    ctx.say(reply).await?;
    Ok(())
}
