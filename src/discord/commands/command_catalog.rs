// Discord commands module.
// Each feature gets its own command file.

pub mod points;

pub mod setup;

pub mod help;

pub mod presence;

use crate::discord::{Data, Error};

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        points::claim(),
        points::points(),
        points::cooldowns(),
        points::leaderboard(),
        points::award(),
        setup::setup(),
        help::help(),
    ]
}
