// Ports for the points system: the ledger store and the audit sink.
//
// The core defines WHAT it needs; `infra` provides SQLite and in-memory
// stores and `discord` provides the audit sink.

use super::points_models::{
    AuditEvent, Category, ConfigUpdate, GatedIncrement, GuildConfig, LeaderboardMetric,
    LedgerEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PointsError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Amount must be at least 1 (got {0})")]
    InvalidAmount(i64),

    #[error("Ledger unavailable: {0}")]
    StoreUnavailable(String),
}

impl PointsError {
    /// True for input problems that were rejected before touching the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PointsError::UnknownCategory(_) | PointsError::InvalidAmount(_)
        )
    }
}

impl From<sqlx::Error> for PointsError {
    fn from(err: sqlx::Error) -> Self {
        PointsError::StoreUnavailable(err.to_string())
    }
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Persistence for ledger entries, cooldown marks and guild configuration.
///
/// Implementations must make `apply_increment` atomic per (guild, user):
/// two concurrent increments for the same member may not lose either update.
/// Amounts below 1 are rejected with `PointsError::InvalidAmount`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create a zeroed entry if none exists. Existing entries are untouched.
    async fn ensure_entry(&self, guild_id: u64, user_id: u64) -> Result<(), PointsError>;

    /// Add `amount` to both the category counter and the total, creating the
    /// entry if needed, and return the updated entry.
    async fn apply_increment(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        amount: i64,
    ) -> Result<LedgerEntry, PointsError>;

    /// Check the cooldown mark and, if `cooldown` has elapsed since it (or
    /// there is none), add `amount` and move the mark to `now`.
    ///
    /// The check and both writes form one atomic step per
    /// (guild, user, category): concurrent callers get exactly one `Applied`,
    /// and the increment is never kept without its mark.
    async fn apply_gated_increment(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        amount: i64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<GatedIncrement, PointsError>;

    /// Read an entry. Unknown members read as all zeros.
    async fn read_entry(&self, guild_id: u64, user_id: u64) -> Result<LedgerEntry, PointsError>;

    /// Up to `limit` entries ordered by `metric` descending, ties broken by
    /// the order members were first seen.
    async fn rank_top(
        &self,
        guild_id: u64,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, PointsError>;

    /// Stored configuration, or an empty one for unconfigured guilds.
    async fn read_config(&self, guild_id: u64) -> Result<GuildConfig, PointsError>;

    /// Replace the stored configuration for `config.guild_id`.
    async fn save_config(&self, config: GuildConfig) -> Result<(), PointsError>;

    /// Merge a partial update into the stored configuration.
    async fn upsert_config(
        &self,
        guild_id: u64,
        update: &ConfigUpdate,
    ) -> Result<GuildConfig, PointsError> {
        let mut config = self.read_config(guild_id).await?;
        config.apply(update);
        self.save_config(config.clone()).await?;
        Ok(config)
    }

    async fn get_cooldown_mark(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
    ) -> Result<Option<DateTime<Utc>>, PointsError>;

    /// Upsert; overwrites any previous mark for the same key.
    async fn set_cooldown_mark(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        at: DateTime<Utc>,
    ) -> Result<(), PointsError>;
}

// ============================================================================
// AUDIT SINK
// ============================================================================

/// Delivers award notifications to a guild's audit channel.
///
/// Failures are reported back but the service never lets them affect an award.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn publish(&self, channel_id: u64, event: &AuditEvent) -> anyhow::Result<()>;
}
