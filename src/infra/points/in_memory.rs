// In-memory implementation of LedgerStore.
//
// Backed by DashMap so concurrent tasks can share it without an outer Mutex.
// The entry API holds the shard lock for the duration of an update, which is
// what makes `apply_increment` atomic per member. Gated increments hold the
// mark's lock while the ledger is updated.

use crate::core::points::{
    Category, GatedIncrement, GuildConfig, LeaderboardMetric, LedgerEntry, LedgerStore,
    PointsError,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// (guild_id, user_id)
type MemberKey = (u64, u64);

#[derive(Clone, Debug)]
struct StoredEntry {
    entry: LedgerEntry,
    /// Order in which the member was first seen; used to break ranking ties.
    first_seen: u64,
}

pub struct InMemoryPointsStore {
    entries: DashMap<MemberKey, StoredEntry>,
    marks: DashMap<(u64, u64, Category), DateTime<Utc>>,
    configs: DashMap<u64, GuildConfig>,
    next_seq: AtomicU64,
}

impl InMemoryPointsStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            marks: DashMap::new(),
            configs: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    fn new_stored(&self, guild_id: u64, user_id: u64) -> StoredEntry {
        StoredEntry {
            entry: LedgerEntry::empty(guild_id, user_id),
            first_seen: self.next_seq.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn increment(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        amount: i64,
    ) -> LedgerEntry {
        let mut stored = self
            .entries
            .entry((guild_id, user_id))
            .or_insert_with(|| self.new_stored(guild_id, user_id));

        let entry = &mut stored.entry;
        *entry.counters.get_mut(category) += amount;
        entry.total += amount;
        entry.clone()
    }
}

impl Default for InMemoryPointsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryPointsStore {
    async fn ensure_entry(&self, guild_id: u64, user_id: u64) -> Result<(), PointsError> {
        self.entries
            .entry((guild_id, user_id))
            .or_insert_with(|| self.new_stored(guild_id, user_id));
        Ok(())
    }

    async fn apply_increment(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        amount: i64,
    ) -> Result<LedgerEntry, PointsError> {
        if amount < 1 {
            return Err(PointsError::InvalidAmount(amount));
        }
        Ok(self.increment(guild_id, user_id, category, amount))
    }

    async fn apply_gated_increment(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        amount: i64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<GatedIncrement, PointsError> {
        if amount < 1 {
            return Err(PointsError::InvalidAmount(amount));
        }

        let mark = self.marks.entry((guild_id, user_id, category));
        if let Entry::Occupied(existing) = &mark {
            let last_claim = *existing.get();
            if last_claim > now - cooldown {
                return Ok(GatedIncrement::Blocked { last_claim });
            }
        }

        let entry = self.increment(guild_id, user_id, category, amount);
        mark.insert(now);
        Ok(GatedIncrement::Applied(entry))
    }

    async fn read_entry(&self, guild_id: u64, user_id: u64) -> Result<LedgerEntry, PointsError> {
        Ok(self
            .entries
            .get(&(guild_id, user_id))
            .map(|stored| stored.entry.clone())
            .unwrap_or_else(|| LedgerEntry::empty(guild_id, user_id)))
    }

    async fn rank_top(
        &self,
        guild_id: u64,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, PointsError> {
        let mut members: Vec<StoredEntry> = self
            .entries
            .iter()
            .filter(|item| item.key().0 == guild_id)
            .map(|item| item.value().clone())
            .collect();

        members.sort_by(|a, b| {
            b.entry
                .score(metric)
                .cmp(&a.entry.score(metric))
                .then(a.first_seen.cmp(&b.first_seen))
        });

        Ok(members
            .into_iter()
            .take(limit)
            .map(|stored| stored.entry)
            .collect())
    }

    async fn read_config(&self, guild_id: u64) -> Result<GuildConfig, PointsError> {
        Ok(self
            .configs
            .get(&guild_id)
            .map(|config| config.clone())
            .unwrap_or_else(|| GuildConfig::new(guild_id)))
    }

    async fn save_config(&self, config: GuildConfig) -> Result<(), PointsError> {
        self.configs.insert(config.guild_id, config);
        Ok(())
    }

    async fn get_cooldown_mark(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
    ) -> Result<Option<DateTime<Utc>>, PointsError> {
        Ok(self
            .marks
            .get(&(guild_id, user_id, category))
            .map(|mark| *mark))
    }

    async fn set_cooldown_mark(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        at: DateTime<Utc>,
    ) -> Result<(), PointsError> {
        self.marks.insert((guild_id, user_id, category), at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::points::ConfigUpdate;
    use std::sync::Arc;

    #[tokio::test]
    async fn ensure_then_read_is_zero() {
        let store = InMemoryPointsStore::new();
        store.ensure_entry(1, 2).await.unwrap();
        store.ensure_entry(1, 2).await.unwrap();
        assert_eq!(store.read_entry(1, 2).await.unwrap(), LedgerEntry::empty(1, 2));
    }

    #[tokio::test]
    async fn total_tracks_sum_of_counters() {
        let store = InMemoryPointsStore::new();
        let steps = [
            (Category::Gym, 2),
            (Category::Exercise, 1),
            (Category::Cricket, 5),
            (Category::Gym, 10),
            (Category::Badminton, 5),
        ];
        for (category, amount) in steps {
            let entry = store.apply_increment(1, 2, category, amount).await.unwrap();
            let sum: i64 = entry.counters.iter().map(|(_, v)| *v).sum();
            assert_eq!(entry.total, sum);
        }
        assert_eq!(store.read_entry(1, 2).await.unwrap().total, 23);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryPointsStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.apply_increment(1, 2, Category::Gym, 2).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let entry = store.read_entry(1, 2).await.unwrap();
        assert_eq!(entry.counters.gym, 100);
        assert_eq!(entry.total, 100);
    }

    #[tokio::test]
    async fn ranking_breaks_ties_by_first_seen() {
        let store = InMemoryPointsStore::new();
        store.apply_increment(1, 30, Category::Cricket, 5).await.unwrap();
        store.apply_increment(1, 10, Category::Badminton, 5).await.unwrap();
        store.apply_increment(1, 20, Category::Gym, 9).await.unwrap();
        store.apply_increment(2, 99, Category::Gym, 50).await.unwrap();

        let top = store.rank_top(1, LeaderboardMetric::Total, 10).await.unwrap();
        let ids: Vec<u64> = top.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![20, 30, 10]);

        let top_one = store
            .rank_top(1, LeaderboardMetric::Category(Category::Badminton), 1)
            .await
            .unwrap();
        assert_eq!(top_one[0].user_id, 10);
    }

    #[tokio::test]
    async fn non_positive_increments_are_rejected() {
        let store = InMemoryPointsStore::new();
        for amount in [0, -5] {
            let err = store
                .apply_increment(1, 2, Category::Gym, amount)
                .await
                .unwrap_err();
            assert!(matches!(err, PointsError::InvalidAmount(a) if a == amount));
        }
        assert_eq!(store.read_entry(1, 2).await.unwrap(), LedgerEntry::empty(1, 2));
    }

    #[tokio::test]
    async fn gated_increment_respects_the_mark() {
        let store = InMemoryPointsStore::new();
        let now = Utc::now();
        let cooldown = Duration::hours(12);

        let first = store
            .apply_gated_increment(1, 2, Category::Gym, 2, now, cooldown)
            .await
            .unwrap();
        assert!(matches!(first, GatedIncrement::Applied(ref e) if e.total == 2));

        let almost = now + cooldown - Duration::milliseconds(1);
        let blocked = store
            .apply_gated_increment(1, 2, Category::Gym, 2, almost, cooldown)
            .await
            .unwrap();
        assert_eq!(blocked, GatedIncrement::Blocked { last_claim: now });

        let elapsed = now + cooldown;
        let second = store
            .apply_gated_increment(1, 2, Category::Gym, 2, elapsed, cooldown)
            .await
            .unwrap();
        assert!(matches!(second, GatedIncrement::Applied(ref e) if e.total == 4));
        assert_eq!(
            store.get_cooldown_mark(1, 2, Category::Gym).await.unwrap(),
            Some(elapsed)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_gated_increments_apply_once() {
        let store = Arc::new(InMemoryPointsStore::new());
        let now = Utc::now();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .apply_gated_increment(1, 2, Category::Cricket, 5, now, Duration::hours(12))
                    .await
                    .unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if let GatedIncrement::Applied(_) = handle.await.unwrap() {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
        assert_eq!(store.read_entry(1, 2).await.unwrap().total, 5);
    }

    #[tokio::test]
    async fn marks_overwrite_per_key() {
        let store = InMemoryPointsStore::new();
        let first = Utc::now();
        let second = first + Duration::hours(1);

        assert_eq!(store.get_cooldown_mark(1, 2, Category::Gym).await.unwrap(), None);
        store.set_cooldown_mark(1, 2, Category::Gym, first).await.unwrap();
        store.set_cooldown_mark(1, 2, Category::Gym, second).await.unwrap();

        assert_eq!(
            store.get_cooldown_mark(1, 2, Category::Gym).await.unwrap(),
            Some(second)
        );
        assert_eq!(
            store.get_cooldown_mark(1, 2, Category::Cricket).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn upsert_keeps_previous_fields() {
        let store = InMemoryPointsStore::new();
        store
            .upsert_config(1, &ConfigUpdate::checkins_channel(10))
            .await
            .unwrap();
        store
            .upsert_config(1, &ConfigUpdate::audit_channel(20))
            .await
            .unwrap();

        let config = store.read_config(1).await.unwrap();
        assert_eq!(config.checkins_channel_id, Some(10));
        assert_eq!(config.audit_channel_id, Some(20));
    }
}
