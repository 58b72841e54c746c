// Bot presence.
//
// Discord-layer glue only: we set a status line once the gateway is ready so
// members can see the bot is watching check-ins.

use poise::serenity_prelude as serenity;

/// Sets the default "watching" status.
pub fn reset_status(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("your check-ins 💪");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready.
pub fn on_ready(ctx: &serenity::Context) {
    reset_status(ctx);
}
