pub mod config;
pub mod enterprise;
pub mod init;
pub mod order;
pub mod order_cycle;
pub mod schedule;
pub mod subscription;
pub mod user;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use cycle_core::{config::Config, enterprise::User, store::Store, types::UserId};
use std::path::Path;

/// Loaded config plus an open store for one command invocation.
pub struct Workspace {
    pub config: Config,
    pub store: Store,
}

pub fn open(root: &Path) -> anyhow::Result<Workspace> {
    let config = Config::load(root).context("failed to load config")?;
    let db = config.database_path(root);
    let store =
        Store::open(&db).with_context(|| format!("failed to open database {}", db.display()))?;
    Ok(Workspace { config, store })
}

/// Resolve `--user` into the acting user.
pub fn acting_user(store: &Store, user: Option<UserId>) -> anyhow::Result<User> {
    let id = user.ok_or_else(|| anyhow::anyhow!("--user (or CYCLES_USER) is required"))?;
    store
        .find_user(id)
        .with_context(|| format!("user {id} not found"))
}

/// Parse a comma-separated id list. An empty string is the empty list.
pub fn parse_ids(raw: &str) -> anyhow::Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("invalid id '{s}'"))
        })
        .collect()
}

/// Parse a timestamp argument. `none` clears the value.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` and `YYYY-MM-DD` (midnight), all UTC.
pub fn parse_time(raw: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") || raw.is_empty() {
        return Ok(None);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(t.with_timezone(&Utc)));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(Some(t.and_utc()));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid time '{raw}'"))?;
    Ok(date.and_hms_opt(0, 0, 0).map(|t| t.and_utc()))
}

pub fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
