// Presentation helpers shared by commands, check-in reactions and the audit sink.
// Nothing here touches the ledger; it only turns core values into text.

use crate::core::points::Category;
use chrono::Duration;
use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;

pub const COLOR_SUCCESS: u32 = 0x2ECC71;
pub const COLOR_COOLDOWN: u32 = 0xFFA500;
pub const COLOR_INFO: u32 = 0x3498DB;

pub fn category_emoji(category: Category) -> &'static str {
    match category {
        Category::Gym => "🏋️",
        Category::Badminton => "🏸",
        Category::Cricket => "🏏",
        Category::Exercise => "💪",
    }
}

pub fn category_reaction(category: Category) -> serenity::ReactionType {
    serenity::ReactionType::Unicode(category_emoji(category).to_string())
}

/// Render a wait as "Xh Ym Zs". Sub-second remainders round up so a
/// member is never told "0s" while still blocked.
pub fn format_wait(wait: Duration) -> String {
    let millis = wait.num_milliseconds().max(0);
    let total_secs = (millis + 999) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// Whole hours when the duration divides evenly, otherwise the countdown form.
pub fn format_cooldown(duration: Duration) -> String {
    if duration.num_milliseconds() % 3_600_000 == 0 {
        let hours = duration.num_hours();
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else {
        format_wait(duration)
    }
}

pub fn rank_medal(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "▫️",
    }
}

pub fn random_flavor_line() -> &'static str {
    const FLAVOR_LINES: [&str; 5] = [
        "Consistency beats intensity.",
        "Another one in the books!",
        "Your future self says thanks.",
        "Sweat now, flex later.",
        "Keep showing up.",
    ];

    FLAVOR_LINES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FLAVOR_LINES[0])
}
