// Cooldown rules: which duration applies to a category in a guild, and how
// long a member still has to wait. Pure functions over config and timestamps.

use super::points_models::{Category, GuildConfig, PerCategory};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct CooldownPolicy {
    defaults_ms: PerCategory<i64>,
}

impl CooldownPolicy {
    pub fn new(defaults_ms: PerCategory<i64>) -> Self {
        Self { defaults_ms }
    }

    /// The guild's override if one is set, else the default.
    ///
    /// A stored override of zero counts as unset, so it falls back to the
    /// default rather than disabling the cooldown.
    pub fn effective_duration(&self, config: &GuildConfig, category: Category) -> Duration {
        let ms = config
            .cooldown_overrides_ms
            .get(category)
            .filter(|ms| *ms > 0)
            .unwrap_or(*self.defaults_ms.get(category));
        Duration::milliseconds(ms)
    }

    /// Time left before `category` can be claimed again. Zero means "now".
    pub fn remaining_wait(
        &self,
        config: &GuildConfig,
        category: Category,
        last_claim: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Duration {
        let Some(last_claim) = last_claim else {
            return Duration::zero();
        };

        let remaining = self.effective_duration(config, category) - (now - last_claim);
        if remaining > Duration::zero() {
            remaining
        } else {
            Duration::zero()
        }
    }
}
