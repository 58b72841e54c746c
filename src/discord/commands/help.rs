use crate::discord::formatter::COLOR_INFO;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

// Sections shown in /help, in display order.
const SECTION_ORDER: &[&str] = &["Earn Points", "Progress", "Admin"];

fn section_emoji(section: &str) -> &'static str {
    match section {
        "Earn Points" => "💪",
        "Progress" => "📈",
        "Admin" => "🛠️",
        _ => "•",
    }
}

struct CommandMetadata {
    section: &'static str,
    priority: i32,
    note: Option<&'static str>,
}

fn get_command_metadata(name: &str) -> CommandMetadata {
    match name {
        "claim" => CommandMetadata {
            section: "Earn Points",
            priority: 100,
            note: Some("Or just post about your workout in the check-ins channel."),
        },
        "cooldowns" => CommandMetadata {
            section: "Earn Points",
            priority: 90,
            note: None,
        },
        "points" => CommandMetadata {
            section: "Progress",
            priority: 80,
            note: None,
        },
        "leaderboard" => CommandMetadata {
            section: "Progress",
            priority: 70,
            note: Some("Pick a category to see who leads each activity."),
        },
        "award" => CommandMetadata {
            section: "Admin",
            priority: 60,
            note: Some("Skips cooldowns. Requires Administrator."),
        },
        "setup" => CommandMetadata {
            section: "Admin",
            priority: 50,
            note: Some("Subcommands: status, checkins_channel, audit_channel, cooldown"),
        },
        _ => CommandMetadata {
            section: "Progress",
            priority: 0,
            note: None,
        },
    }
}

/// List the bot's commands.
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let mut entries: Vec<(CommandMetadata, String, String)> = ctx
        .framework()
        .options()
        .commands
        .iter()
        .filter(|command| command.name != "help")
        .map(|command| {
            let description = command
                .description
                .clone()
                .unwrap_or_else(|| "No description".to_string());
            (
                get_command_metadata(&command.name),
                command.name.clone(),
                description,
            )
        })
        .collect();
    entries.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));

    let mut embed = serenity::CreateEmbed::new()
        .title("Fitness Points — Help")
        .description("Earn points for staying active. Each activity has its own cooldown.")
        .color(COLOR_INFO);

    for section in SECTION_ORDER {
        let lines: Vec<String> = entries
            .iter()
            .filter(|(meta, _, _)| meta.section == *section)
            .map(|(meta, name, description)| match meta.note {
                Some(note) => format!("`/{}` {}\n↳ {}", name, description, note),
                None => format!("`/{}` {}", name, description),
            })
            .collect();

        if !lines.is_empty() {
            embed = embed.field(
                format!("{} {}", section_emoji(section), section),
                lines.join("\n"),
                false,
            );
        }
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
