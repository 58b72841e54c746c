// Domain models for the points ledger.
//
// Everything here is plain data keyed by primitive Discord-agnostic ids
// (u64 guild/user/channel ids), so the rest of the core can be exercised
// without a gateway connection.

use super::points_store::PointsError;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORIES
// ============================================================================

/// The fixed set of activities a member can earn points in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Gym,
    Badminton,
    Cricket,
    Exercise,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Gym,
        Category::Badminton,
        Category::Cricket,
        Category::Exercise,
    ];

    /// Stable lowercase identifier. Also used as the storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gym => "gym",
            Category::Badminton => "badminton",
            Category::Cricket => "cricket",
            Category::Exercise => "exercise",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Gym => "Gym",
            Category::Badminton => "Badminton",
            Category::Cricket => "Cricket",
            Category::Exercise => "Exercise",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PointsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| PointsError::UnknownCategory(s.to_string()))
    }
}

/// One value per category. Used for counters, point values and cooldowns
/// so a missing category is a compile error rather than a runtime lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerCategory<T> {
    pub gym: T,
    pub badminton: T,
    pub cricket: T,
    pub exercise: T,
}

impl<T> PerCategory<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Gym => &self.gym,
            Category::Badminton => &self.badminton,
            Category::Cricket => &self.cricket,
            Category::Exercise => &self.exercise,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Gym => &mut self.gym,
            Category::Badminton => &mut self.badminton,
            Category::Cricket => &mut self.cricket,
            Category::Exercise => &mut self.exercise,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// A member's points in one guild.
///
/// `total` always equals the sum of `counters`; only `LedgerStore::apply_increment`
/// changes either, and it changes both in the same write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub guild_id: u64,
    pub user_id: u64,
    pub total: i64,
    pub counters: PerCategory<i64>,
}

impl LedgerEntry {
    pub fn empty(guild_id: u64, user_id: u64) -> Self {
        Self {
            guild_id,
            user_id,
            total: 0,
            counters: PerCategory::default(),
        }
    }

    pub fn score(&self, metric: LeaderboardMetric) -> i64 {
        match metric {
            LeaderboardMetric::Total => self.total,
            LeaderboardMetric::Category(category) => *self.counters.get(category),
        }
    }
}

/// What a leaderboard is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardMetric {
    Total,
    Category(Category),
}

impl LeaderboardMetric {
    pub fn label(&self) -> &'static str {
        match self {
            LeaderboardMetric::Total => "Total",
            LeaderboardMetric::Category(category) => category.label(),
        }
    }
}

// ============================================================================
// GUILD CONFIGURATION
// ============================================================================

/// Per-guild settings. Cooldown overrides are stored in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildConfig {
    pub guild_id: u64,
    pub checkins_channel_id: Option<u64>,
    pub audit_channel_id: Option<u64>,
    pub cooldown_overrides_ms: PerCategory<Option<i64>>,
}

impl GuildConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            ..Default::default()
        }
    }

    /// Overlay the fields present in `update`; absent fields keep their value.
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(channel_id) = update.checkins_channel_id {
            self.checkins_channel_id = Some(channel_id);
        }
        if let Some(channel_id) = update.audit_channel_id {
            self.audit_channel_id = Some(channel_id);
        }
        for (category, override_ms) in update.cooldown_overrides_ms.iter() {
            // Zero is indistinguishable from "not supplied".
            if let Some(ms) = override_ms.filter(|ms| *ms > 0) {
                *self.cooldown_overrides_ms.get_mut(category) = Some(ms);
            }
        }
    }
}

/// A partial configuration change. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub checkins_channel_id: Option<u64>,
    pub audit_channel_id: Option<u64>,
    pub cooldown_overrides_ms: PerCategory<Option<i64>>,
}

impl ConfigUpdate {
    pub fn checkins_channel(channel_id: u64) -> Self {
        Self {
            checkins_channel_id: Some(channel_id),
            ..Default::default()
        }
    }

    pub fn audit_channel(channel_id: u64) -> Self {
        Self {
            audit_channel_id: Some(channel_id),
            ..Default::default()
        }
    }

    pub fn cooldown(category: Category, duration_ms: i64) -> Self {
        let mut update = Self::default();
        *update.cooldown_overrides_ms.get_mut(category) = Some(duration_ms);
        update
    }
}

// ============================================================================
// RULES
// ============================================================================

pub const MS_PER_HOUR: i64 = 3_600_000;

/// Process-wide point values and default cooldowns, injected into the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsRules {
    pub points: PerCategory<i64>,
    pub default_cooldowns_ms: PerCategory<i64>,
}

impl Default for PointsRules {
    fn default() -> Self {
        Self {
            points: PerCategory {
                gym: 2,
                badminton: 5,
                cricket: 5,
                exercise: 1,
            },
            default_cooldowns_ms: PerCategory {
                gym: 12 * MS_PER_HOUR,
                badminton: 12 * MS_PER_HOUR,
                cricket: 12 * MS_PER_HOUR,
                exercise: 6 * MS_PER_HOUR,
            },
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// The ledger state after a successful award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardReceipt {
    pub category: Category,
    pub awarded: i64,
    pub entry: LedgerEntry,
}

/// Result of a self-service claim. Being on cooldown is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(AwardReceipt),
    OnCooldown {
        category: Category,
        remaining: Duration,
    },
}

/// What the store did with a cooldown-gated increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatedIncrement {
    /// Points were added and the mark moved to the claim time.
    Applied(LedgerEntry),
    /// Nothing was written; `last_claim` is still inside the cooldown.
    Blocked { last_claim: DateTime<Utc> },
}

/// How an award came about, for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardKind {
    Claim,
    CheckIn,
    Manual { reason: Option<String> },
}

/// Describes a completed award for the guild's audit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub guild_id: u64,
    pub actor_id: u64,
    pub user_id: u64,
    pub category: Category,
    pub amount: i64,
    pub total: i64,
    pub kind: AwardKind,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Plain one-line summary, independent of any chat formatting.
    pub fn summary(&self) -> String {
        let how = match &self.kind {
            AwardKind::Claim => "claimed".to_string(),
            AwardKind::CheckIn => "checked in for".to_string(),
            AwardKind::Manual { reason: None } => format!("awarded by {}:", self.actor_id),
            AwardKind::Manual {
                reason: Some(reason),
            } => format!("awarded by {} ({}):", self.actor_id, reason),
        };
        format!(
            "user {} {} {} +{} (total {})",
            self.user_id, how, self.category, self.amount, self.total
        )
    }
}

/// A message posted in a guild, reduced to what check-in matching needs.
#[derive(Debug, Clone)]
pub struct CheckinMessage {
    pub guild_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub is_automated: bool,
    pub text: String,
}
