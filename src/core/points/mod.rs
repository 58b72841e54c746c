// Points module - ledger, cooldown policy and award engine for activity check-ins.

mod checkin_matcher;
mod cooldown_policy;
mod points_models;
mod points_service;
mod points_store;

pub use points_models::{
    AuditEvent, AwardKind, AwardReceipt, Category, CheckinMessage, ClaimOutcome, ConfigUpdate,
    GatedIncrement, GuildConfig, LeaderboardMetric, LedgerEntry, PerCategory, PointsRules, MS_PER_HOUR,
};
pub use points_service::PointsService;
pub use points_store::{AuditSink, LedgerStore, PointsError};
