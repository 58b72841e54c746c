// The points service - claims, manual awards and passive check-ins.
//
// Like the rest of `core`, this has no Discord imports. Callers hand in
// primitive ids and the current time, and get back structured outcomes that
// the Discord layer renders.

use super::checkin_matcher::match_categories;
use super::cooldown_policy::CooldownPolicy;
use super::points_models::{
    AuditEvent, AwardKind, AwardReceipt, Category, CheckinMessage, ClaimOutcome, ConfigUpdate,
    GatedIncrement, GuildConfig, LeaderboardMetric, LedgerEntry, PointsRules, MS_PER_HOUR,
};
use super::points_store::{AuditSink, LedgerStore, PointsError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub struct PointsService<S: LedgerStore> {
    store: S,
    rules: PointsRules,
    cooldowns: CooldownPolicy,
    audit_sink: Option<Arc<dyn AuditSink>>,
}

impl<S: LedgerStore> PointsService<S> {
    pub fn new(store: S, rules: PointsRules) -> Self {
        let cooldowns = CooldownPolicy::new(rules.default_cooldowns_ms);
        Self {
            store,
            rules,
            cooldowns,
            audit_sink: None,
        }
    }

    /// Attach the sink used for audit-channel notifications.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn rules(&self) -> &PointsRules {
        &self.rules
    }

    // ------------------------------------------------------------------------
    // Cooldowns
    // ------------------------------------------------------------------------

    pub async fn effective_cooldown(
        &self,
        guild_id: u64,
        category: Category,
    ) -> Result<Duration, PointsError> {
        let config = self.store.read_config(guild_id).await?;
        Ok(self.cooldowns.effective_duration(&config, category))
    }

    pub async fn remaining_wait(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<Duration, PointsError> {
        let config = self.store.read_config(guild_id).await?;
        self.remaining_wait_with(&config, guild_id, user_id, category, now)
            .await
    }

    async fn remaining_wait_with(
        &self,
        config: &GuildConfig,
        guild_id: u64,
        user_id: u64,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<Duration, PointsError> {
        let mark = self
            .store
            .get_cooldown_mark(guild_id, user_id, category)
            .await?;
        Ok(self.cooldowns.remaining_wait(config, category, mark, now))
    }

    /// Remaining wait for every category, in `Category::ALL` order.
    pub async fn cooldown_status(
        &self,
        guild_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Category, Duration)>, PointsError> {
        let config = self.store.read_config(guild_id).await?;
        let mut status = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let wait = self
                .remaining_wait_with(&config, guild_id, user_id, category, now)
                .await?;
            status.push((category, wait));
        }
        Ok(status)
    }

    // ------------------------------------------------------------------------
    // Awards
    // ------------------------------------------------------------------------

    /// Self-service claim, gated by the category cooldown.
    pub async fn claim(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, PointsError> {
        self.claim_as(guild_id, user_id, category, now, AwardKind::Claim)
            .await
    }

    async fn claim_as(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        now: DateTime<Utc>,
        kind: AwardKind,
    ) -> Result<ClaimOutcome, PointsError> {
        let amount = *self.rules.points.get(category);
        if amount < 1 {
            return Err(PointsError::InvalidAmount(amount));
        }

        let config = self.store.read_config(guild_id).await?;
        let cooldown = self.cooldowns.effective_duration(&config, category);
        let gated = self
            .store
            .apply_gated_increment(guild_id, user_id, category, amount, now, cooldown)
            .await?;
        let entry = match gated {
            GatedIncrement::Applied(entry) => entry,
            GatedIncrement::Blocked { last_claim } => {
                let remaining = self
                    .cooldowns
                    .remaining_wait(&config, category, Some(last_claim), now);
                return Ok(ClaimOutcome::OnCooldown {
                    category,
                    remaining,
                });
            }
        };

        let event = AuditEvent {
            guild_id,
            actor_id: user_id,
            user_id,
            category,
            amount,
            total: entry.total,
            kind,
            at: now,
        };
        self.record(&config, event);

        Ok(ClaimOutcome::Claimed(AwardReceipt {
            category,
            awarded: amount,
            entry,
        }))
    }

    /// Privileged grant that ignores cooldowns and never touches cooldown marks.
    ///
    /// Permission checks belong to the caller.
    pub async fn manual_award(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        amount: i64,
        actor_id: u64,
        reason: Option<String>,
    ) -> Result<AwardReceipt, PointsError> {
        if amount < 1 {
            return Err(PointsError::InvalidAmount(amount));
        }

        self.store.ensure_entry(guild_id, user_id).await?;
        let entry = self
            .store
            .apply_increment(guild_id, user_id, category, amount)
            .await?;

        let event = AuditEvent {
            guild_id,
            actor_id,
            user_id,
            category,
            amount,
            total: entry.total,
            kind: AwardKind::Manual { reason },
            at: Utc::now(),
        };
        match self.store.read_config(guild_id).await {
            Ok(config) => self.record(&config, event),
            Err(err) => {
                tracing::info!(guild_id, "{}", event.summary());
                tracing::debug!(guild_id, "Skipping audit notification: {err}");
            }
        }

        Ok(AwardReceipt {
            category,
            awarded: amount,
            entry,
        })
    }

    /// Handle a message that may be a check-in.
    ///
    /// Returns the successful claims only; categories still on cooldown are
    /// dropped without a trace so the channel isn't spammed.
    pub async fn process_checkin(
        &self,
        message: &CheckinMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<AwardReceipt>, PointsError> {
        if message.is_automated {
            return Ok(Vec::new());
        }

        let config = self.store.read_config(message.guild_id).await?;
        if config.checkins_channel_id != Some(message.channel_id) {
            return Ok(Vec::new());
        }

        let mut receipts = Vec::new();
        for category in match_categories(&message.text) {
            let outcome = self
                .claim_as(
                    message.guild_id,
                    message.author_id,
                    category,
                    now,
                    AwardKind::CheckIn,
                )
                .await?;
            if let ClaimOutcome::Claimed(receipt) = outcome {
                receipts.push(receipt);
            }
        }
        Ok(receipts)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub async fn get_entry(&self, guild_id: u64, user_id: u64) -> Result<LedgerEntry, PointsError> {
        self.store.read_entry(guild_id, user_id).await
    }

    pub async fn leaderboard(
        &self,
        guild_id: u64,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, PointsError> {
        self.store.rank_top(guild_id, metric, limit).await
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    pub async fn get_config(&self, guild_id: u64) -> Result<GuildConfig, PointsError> {
        self.store.read_config(guild_id).await
    }

    pub async fn update_config(
        &self,
        guild_id: u64,
        update: ConfigUpdate,
    ) -> Result<GuildConfig, PointsError> {
        self.store.upsert_config(guild_id, &update).await
    }

    /// Override a category's cooldown, given in whole hours. Zero hours is
    /// treated as "not supplied" and leaves the current setting in place.
    pub async fn set_cooldown_hours(
        &self,
        guild_id: u64,
        category: Category,
        hours: u32,
    ) -> Result<GuildConfig, PointsError> {
        let update = ConfigUpdate::cooldown(category, i64::from(hours) * MS_PER_HOUR);
        self.update_config(guild_id, update).await
    }

    /// Log the award and hand it to the audit sink without waiting.
    fn record(&self, config: &GuildConfig, event: AuditEvent) {
        tracing::info!(
            guild_id = event.guild_id,
            user_id = event.user_id,
            actor_id = event.actor_id,
            category = event.category.as_str(),
            amount = event.amount,
            total = event.total,
            "{}",
            event.summary()
        );

        let (Some(sink), Some(channel_id)) = (self.audit_sink.as_ref(), config.audit_channel_id)
        else {
            return;
        };

        let sink = Arc::clone(sink);
        tokio::spawn(async move {
            if let Err(err) = sink.publish(channel_id, &event).await {
                tracing::debug!(
                    guild_id = event.guild_id,
                    channel_id,
                    "Audit notification dropped: {err}"
                );
            }
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
