// Posts award notifications to a guild's audit channel.

use crate::core::points::{AuditEvent, AuditSink, AwardKind};
use crate::discord::formatter::{category_emoji, COLOR_INFO, COLOR_SUCCESS};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub struct DiscordAuditSink {
    http: Arc<serenity::Http>,
}

impl DiscordAuditSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuditSink for DiscordAuditSink {
    async fn publish(&self, channel_id: u64, event: &AuditEvent) -> anyhow::Result<()> {
        serenity::ChannelId::new(channel_id)
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new().embed(build_audit_embed(event)),
            )
            .await?;
        Ok(())
    }
}

fn build_audit_embed(event: &AuditEvent) -> serenity::CreateEmbed {
    let (title, color) = match &event.kind {
        AwardKind::Claim => ("Points claimed", COLOR_SUCCESS),
        AwardKind::CheckIn => ("Check-in recorded", COLOR_SUCCESS),
        AwardKind::Manual { .. } => ("Points awarded", COLOR_INFO),
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{} {}", category_emoji(event.category), title))
        .description(describe(event))
        .color(color)
        .field("Category", event.category.label(), true)
        .field("Amount", format!("+{}", event.amount), true)
        .field("New Total", event.total.to_string(), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "User ID: {}",
            event.user_id
        )));

    if let Ok(timestamp) = serenity::Timestamp::from_unix_timestamp(event.at.timestamp()) {
        embed = embed.timestamp(timestamp);
    }

    if let AwardKind::Manual {
        reason: Some(reason),
    } = &event.kind
    {
        embed = embed.field("Reason", reason.clone(), false);
    }

    embed
}

fn describe(event: &AuditEvent) -> String {
    match &event.kind {
        AwardKind::Claim => format!("<@{}> claimed {} points.", event.user_id, event.category),
        AwardKind::CheckIn => format!(
            "<@{}> checked in for {}.",
            event.user_id, event.category
        ),
        AwardKind::Manual { .. } => format!(
            "<@{}> awarded {} {} points to <@{}>.",
            event.actor_id, event.amount, event.category, event.user_id
        ),
    }
}
