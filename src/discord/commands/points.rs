// Discord commands for the points system.
//
// Same pattern as every other command file:
// 1. Extract primitive data from Discord types
// 2. Call the core service
// 3. Format the response
//
// Cooldown countdowns and embeds live here; the core only hands back durations.

use crate::core::points::{Category, ClaimOutcome, LeaderboardMetric, PointsService};
use crate::discord::formatter::{
    category_emoji, format_wait, random_flavor_line, rank_medal, COLOR_COOLDOWN, COLOR_INFO,
    COLOR_SUCCESS,
};
use crate::infra::points::SqlitePointsStore;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub points: Arc<PointsService<SqlitePointsStore>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum CategoryChoice {
    #[name = "Gym"]
    Gym,
    #[name = "Badminton"]
    Badminton,
    #[name = "Cricket"]
    Cricket,
    #[name = "Exercise"]
    Exercise,
}

impl From<CategoryChoice> for Category {
    fn from(value: CategoryChoice) -> Self {
        match value {
            CategoryChoice::Gym => Category::Gym,
            CategoryChoice::Badminton => Category::Badminton,
            CategoryChoice::Cricket => Category::Cricket,
            CategoryChoice::Exercise => Category::Exercise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum MetricChoice {
    #[name = "Total"]
    Total,
    #[name = "Gym"]
    Gym,
    #[name = "Badminton"]
    Badminton,
    #[name = "Cricket"]
    Cricket,
    #[name = "Exercise"]
    Exercise,
}

impl From<MetricChoice> for LeaderboardMetric {
    fn from(value: MetricChoice) -> Self {
        match value {
            MetricChoice::Total => LeaderboardMetric::Total,
            MetricChoice::Gym => LeaderboardMetric::Category(Category::Gym),
            MetricChoice::Badminton => LeaderboardMetric::Category(Category::Badminton),
            MetricChoice::Cricket => LeaderboardMetric::Category(Category::Cricket),
            MetricChoice::Exercise => LeaderboardMetric::Category(Category::Exercise),
        }
    }
}

fn guild_id_of(ctx: &Context<'_>) -> Result<u64, Error> {
    Ok(ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get())
}

/// Claim points for an activity you just did.
#[poise::command(slash_command, guild_only)]
pub async fn claim(
    ctx: Context<'_>,
    #[description = "What did you do?"] category: CategoryChoice,
) -> Result<(), Error> {
    let user = ctx.author();
    if user.bot {
        ctx.say("Bots don't work out! 🤖").await?;
        return Ok(());
    }

    let guild_id = guild_id_of(&ctx)?;
    let category = Category::from(category);

    let outcome = ctx
        .data()
        .points
        .claim(guild_id, user.id.get(), category, Utc::now())
        .await?;

    match outcome {
        ClaimOutcome::Claimed(receipt) => {
            let embed = serenity::CreateEmbed::new()
                .title(format!(
                    "{} {} points claimed!",
                    category_emoji(receipt.category),
                    receipt.category.label()
                ))
                .description(format!("You earned **{}** points.", receipt.awarded))
                .color(COLOR_SUCCESS)
                .field(
                    receipt.category.label(),
                    receipt.entry.counters.get(receipt.category).to_string(),
                    true,
                )
                .field("Total", format!("**{}**", receipt.entry.total), true)
                .footer(serenity::CreateEmbedFooter::new(random_flavor_line()));

            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        ClaimOutcome::OnCooldown {
            category,
            remaining,
        } => {
            let embed = serenity::CreateEmbed::new()
                .title("⏰ Not yet!")
                .description(format!(
                    "You already claimed {} recently. Try again in **{}**.",
                    category.label(),
                    format_wait(remaining)
                ))
                .color(COLOR_COOLDOWN);

            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
        }
    }

    Ok(())
}

/// Show points for yourself or another member.
#[poise::command(slash_command, guild_only)]
pub async fn points(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    if target_user.bot {
        ctx.say("Bots don't have points! 🤖").await?;
        return Ok(());
    }

    let guild_id = guild_id_of(&ctx)?;
    let entry = ctx
        .data()
        .points
        .get_entry(guild_id, target_user.id.get())
        .await?;

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{}'s points", target_user.name))
        .color(COLOR_INFO)
        .thumbnail(target_user.face());

    for (category, value) in entry.counters.iter() {
        embed = embed.field(
            format!("{} {}", category_emoji(category), category.label()),
            value.to_string(),
            true,
        );
    }
    embed = embed.field("Total", format!("**{}**", entry.total), false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show when each activity can be claimed again.
#[poise::command(slash_command, guild_only)]
pub async fn cooldowns(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    let guild_id = guild_id_of(&ctx)?;

    let status = ctx
        .data()
        .points
        .cooldown_status(guild_id, target_user.id.get(), Utc::now())
        .await?;

    let lines = status
        .iter()
        .map(|(category, wait)| {
            let state = if wait.num_milliseconds() > 0 {
                format!("⏳ {}", format_wait(*wait))
            } else {
                "✅ Ready".to_string()
            };
            format!("{} **{}** — {}", category_emoji(*category), category.label(), state)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title(format!("Cooldowns for {}", target_user.name))
        .description(lines)
        .color(COLOR_INFO);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Show the top members by total or by activity.
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Rank by (default: Total)"] metric: Option<MetricChoice>,
    #[description = "How many members to show (default: 10)"]
    #[min = 1]
    #[max = 25]
    limit: Option<usize>,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;
    let metric = LeaderboardMetric::from(metric.unwrap_or(MetricChoice::Total));
    let limit = limit.unwrap_or(10).clamp(1, 25);

    let entries = ctx
        .data()
        .points
        .leaderboard(guild_id, metric, limit)
        .await?;

    // Members only appear once they have scored in this metric.
    let ranked: Vec<_> = entries
        .into_iter()
        .filter(|entry| entry.score(metric) > 0)
        .collect();

    if ranked.is_empty() {
        ctx.say("No one has scored here yet! Post a check-in or use `/claim` to get started 💪")
            .await?;
        return Ok(());
    }

    let me = ctx.author().id.get();
    let description = ranked
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let rank = index + 1;
            let name = resolve_display_name_cached(&ctx, guild_id, entry.user_id);
            let name = if entry.user_id == me {
                format!("**{}** (You)", name)
            } else {
                name
            };
            format!(
                "{} #{} {} — {} pts",
                rank_medal(rank),
                rank,
                name,
                entry.score(metric)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title(format!("🏆 Leaderboard — {}", metric.label()))
        .description(description)
        .color(COLOR_INFO);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Award points to a member without a cooldown (admin only).
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn award(
    ctx: Context<'_>,
    #[description = "Member to award"] user: serenity::User,
    #[description = "Activity category"] category: CategoryChoice,
    #[description = "Points to add"]
    #[min = 1]
    amount: i64,
    #[description = "Why are you awarding these points?"] reason: Option<String>,
) -> Result<(), Error> {
    if user.bot {
        ctx.say("You can't award points to bots!").await?;
        return Ok(());
    }

    let guild_id = guild_id_of(&ctx)?;
    let category = Category::from(category);

    let receipt = ctx
        .data()
        .points
        .manual_award(
            guild_id,
            user.id.get(),
            category,
            amount,
            ctx.author().id.get(),
            reason.clone(),
        )
        .await?;

    let mut message = format!(
        "✅ Gave {} {} points to <@{}>. New total: **{}**.",
        receipt.awarded,
        category.label(),
        user.id.get(),
        receipt.entry.total
    );
    if let Some(reason) = reason {
        message.push_str(&format!("\nReason: {}", reason));
    }

    ctx.say(message).await?;
    Ok(())
}

/// Resolve a display name using the cache only, falling back to a mention.
fn resolve_display_name_cached(ctx: &Context<'_>, guild_id: u64, user_id: u64) -> String {
    let guild_id_s = serenity::GuildId::from(guild_id);
    let user_id_s = serenity::UserId::from(user_id);

    if let Some(guild) = ctx.serenity_context().cache.guild(guild_id_s) {
        if let Some(member) = guild.members.get(&user_id_s) {
            return member.display_name().to_string();
        }
    }

    if let Some(user) = ctx.serenity_context().cache.user(user_id_s) {
        return user.name.clone();
    }

    format!("<@{}>", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_choices_map_one_to_one() {
        let mapped: Vec<Category> = [
            CategoryChoice::Gym,
            CategoryChoice::Badminton,
            CategoryChoice::Cricket,
            CategoryChoice::Exercise,
        ]
        .into_iter()
        .map(Category::from)
        .collect();
        assert_eq!(mapped, Category::ALL.to_vec());
    }

    #[test]
    fn metric_choices_cover_total_and_categories() {
        assert_eq!(
            LeaderboardMetric::from(MetricChoice::Total),
            LeaderboardMetric::Total
        );
        assert_eq!(
            LeaderboardMetric::from(MetricChoice::Cricket),
            LeaderboardMetric::Category(Category::Cricket)
        );
    }
}
