// SQLite implementation of LedgerStore.
//
// Tables:
// - ledger_entries: per-member totals with one column per category
// - cooldown_marks: last successful claim per member and category (epoch ms)
// - guild_config: check-in/audit channels and cooldown overrides (ms)

use crate::core::points::{
    Category, GatedIncrement, GuildConfig, LeaderboardMetric, LedgerEntry, LedgerStore,
    PerCategory, PointsError,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

const ENTRY_COLUMNS: &str = "guild_id, user_id, total, gym, badminton, cricket, exercise";

pub struct SqlitePointsStore {
    pool: Pool<Sqlite>,
}

impl SqlitePointsStore {
    /// Open (or create) the database at `database_path` and run migrations.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", database_path))
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_entries (
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                total INTEGER NOT NULL DEFAULT 0,
                gym INTEGER NOT NULL DEFAULT 0,
                badminton INTEGER NOT NULL DEFAULT 0,
                cricket INTEGER NOT NULL DEFAULT 0,
                exercise INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (guild_id, user_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cooldown_marks (
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                last_claim_ms INTEGER NOT NULL,
                PRIMARY KEY (guild_id, user_id, category)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_config (
                guild_id INTEGER PRIMARY KEY,
                checkins_channel_id INTEGER,
                audit_channel_id INTEGER,
                gym_cooldown_ms INTEGER,
                badminton_cooldown_ms INTEGER,
                cricket_cooldown_ms INTEGER,
                exercise_cooldown_ms INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Column holding a metric. Category names double as column names.
fn metric_column(metric: LeaderboardMetric) -> &'static str {
    match metric {
        LeaderboardMetric::Total => "total",
        LeaderboardMetric::Category(category) => category.as_str(),
    }
}

fn entry_from_row(row: &SqliteRow) -> LedgerEntry {
    LedgerEntry {
        guild_id: row.get::<i64, _>("guild_id") as u64,
        user_id: row.get::<i64, _>("user_id") as u64,
        total: row.get("total"),
        counters: PerCategory {
            gym: row.get("gym"),
            badminton: row.get("badminton"),
            cricket: row.get("cricket"),
            exercise: row.get("exercise"),
        },
    }
}

/// Upsert adding the bound amount to `category` and the total.
/// Binds: guild_id, user_id, amount, amount.
fn increment_sql(category: Category) -> String {
    let column = category.as_str();
    format!(
        r#"
        INSERT INTO ledger_entries (guild_id, user_id, total, {column})
        VALUES (?, ?, ?, ?)
        ON CONFLICT(guild_id, user_id) DO UPDATE SET
            {column} = {column} + excluded.{column},
            total = total + excluded.total
        RETURNING {ENTRY_COLUMNS}
        "#
    )
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, PointsError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| PointsError::StoreUnavailable(format!("Corrupt cooldown mark: {ms}")))
}

#[async_trait]
impl LedgerStore for SqlitePointsStore {
    async fn ensure_entry(&self, guild_id: u64, user_id: u64) -> Result<(), PointsError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (guild_id, user_id)
            VALUES (?, ?)
            ON CONFLICT(guild_id, user_id) DO NOTHING
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .execute(&self.pool)
        .await?;

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

        // A single upsert statement, so SQLite serializes concurrent writers.
        let row = sqlx::query(&increment_sql(category))
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .bind(amount)
            .bind(amount)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry_from_row(&row))
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

        let mut tx = self.pool.begin().await?;

        // Writing the mark first takes the write lock before anything is read.
        // The upsert only fires when the previous claim is old enough.
        let marked = sqlx::query(
            r#"
            INSERT INTO cooldown_marks (guild_id, user_id, category, last_claim_ms)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(guild_id, user_id, category) DO UPDATE SET
                last_claim_ms = excluded.last_claim_ms
            WHERE cooldown_marks.last_claim_ms <= ?
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .bind(category.as_str())
        .bind(now.timestamp_millis())
        .bind(now.timestamp_millis() - cooldown.num_milliseconds())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if marked == 0 {
            let last_claim_ms: i64 = sqlx::query_scalar(
                r#"
                SELECT last_claim_ms FROM cooldown_marks
                WHERE guild_id = ? AND user_id = ? AND category = ?
                "#,
            )
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .bind(category.as_str())
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Ok(GatedIncrement::Blocked {
                last_claim: from_millis(last_claim_ms)?,
            });
        }

        let row = sqlx::query(&increment_sql(category))
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .bind(amount)
            .bind(amount)
            .fetch_one(&mut *tx)
            .await?;
        let entry = entry_from_row(&row);
        tx.commit().await?;

        Ok(GatedIncrement::Applied(entry))
    }

    async fn read_entry(&self, guild_id: u64, user_id: u64) -> Result<LedgerEntry, PointsError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE guild_id = ? AND user_id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .map(|row| entry_from_row(&row))
            .unwrap_or_else(|| LedgerEntry::empty(guild_id, user_id)))
    }

    async fn rank_top(
        &self,
        guild_id: u64,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, PointsError> {
        // rowid follows insertion order, which is when the member was first seen.
        let column = metric_column(metric);
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE guild_id = ?
            ORDER BY {column} DESC, rowid ASC
            LIMIT ?
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    async fn read_config(&self, guild_id: u64) -> Result<GuildConfig, PointsError> {
        let row = sqlx::query("SELECT * FROM guild_config WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(GuildConfig::new(guild_id));
        };

        let channel = |name: &str| row.get::<Option<i64>, _>(name).map(|id| id as u64);
        Ok(GuildConfig {
            guild_id,
            checkins_channel_id: channel("checkins_channel_id"),
            audit_channel_id: channel("audit_channel_id"),
            cooldown_overrides_ms: PerCategory {
                gym: row.get("gym_cooldown_ms"),
                badminton: row.get("badminton_cooldown_ms"),
                cricket: row.get("cricket_cooldown_ms"),
                exercise: row.get("exercise_cooldown_ms"),
            },
        })
    }

    async fn save_config(&self, config: GuildConfig) -> Result<(), PointsError> {
        let overrides = &config.cooldown_overrides_ms;
        sqlx::query(
            r#"
            INSERT INTO guild_config (
                guild_id, checkins_channel_id, audit_channel_id,
                gym_cooldown_ms, badminton_cooldown_ms, cricket_cooldown_ms, exercise_cooldown_ms
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                checkins_channel_id = excluded.checkins_channel_id,
                audit_channel_id = excluded.audit_channel_id,
                gym_cooldown_ms = excluded.gym_cooldown_ms,
                badminton_cooldown_ms = excluded.badminton_cooldown_ms,
                cricket_cooldown_ms = excluded.cricket_cooldown_ms,
                exercise_cooldown_ms = excluded.exercise_cooldown_ms
            "#,
        )
        .bind(config.guild_id as i64)
        .bind(config.checkins_channel_id.map(|id| id as i64))
        .bind(config.audit_channel_id.map(|id| id as i64))
        .bind(overrides.gym)
        .bind(overrides.badminton)
        .bind(overrides.cricket)
        .bind(overrides.exercise)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_cooldown_mark(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
    ) -> Result<Option<DateTime<Utc>>, PointsError> {
        let row = sqlx::query(
            r#"
            SELECT last_claim_ms FROM cooldown_marks
            WHERE guild_id = ? AND user_id = ? AND category = ?
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| from_millis(row.get("last_claim_ms")))
            .transpose()
    }

    async fn set_cooldown_mark(
        &self,
        guild_id: u64,
        user_id: u64,
        category: Category,
        at: DateTime<Utc>,
    ) -> Result<(), PointsError> {
        sqlx::query(
            r#"
            INSERT INTO cooldown_marks (guild_id, user_id, category, last_claim_ms)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(guild_id, user_id, category) DO UPDATE SET
                last_claim_ms = excluded.last_claim_ms
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .bind(category.as_str())
        .bind(at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
