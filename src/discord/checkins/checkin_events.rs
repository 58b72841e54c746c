// Passive check-ins: messages in the configured channel earn points.
//
// The core decides whether a message counts and whether each category is off
// cooldown. This layer only builds the CheckinMessage and reacts to successes.
// Cooldown hits produce nothing at all, so busy channels don't get spammed.

use crate::core::points::CheckinMessage;
use crate::discord::formatter::category_reaction;
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// Returns how many categories were claimed.
pub async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
) -> Result<usize, Error> {
    let Some(guild_id) = message.guild_id else {
        return Ok(0);
    };

    let checkin = CheckinMessage {
        guild_id: guild_id.get(),
        channel_id: message.channel_id.get(),
        author_id: message.author.id.get(),
        is_automated: message.author.bot || message.webhook_id.is_some(),
        text: message.content.clone(),
    };

    let receipts = data.points.process_checkin(&checkin, Utc::now()).await?;

    for receipt in &receipts {
        if let Err(err) = message
            .react(ctx, category_reaction(receipt.category))
            .await
        {
            tracing::warn!(
                guild_id = checkin.guild_id,
                channel_id = checkin.channel_id,
                category = receipt.category.as_str(),
                error = %err,
                "Failed to react to check-in"
            );
        }
    }

    Ok(receipts.len())
}
