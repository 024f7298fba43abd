//! Small SQL helpers shared by the admin services

use crate::error::{AdminError, AdminResult};
use crate::gateway::rows::{add_decimal, opt_decimal_at};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use rust_decimal::Decimal;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// AND-joined WHERE clause with positional parameters
#[derive(Debug, Default)]
pub struct WhereBuilder {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `clause`; its `?` placeholders bind `values` in order
    pub fn push(&mut self, clause: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.values.extend(values);
    }

    /// `" WHERE a AND b"`, or empty when nothing was pushed
    pub fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Bound values followed by `extra` (LIMIT/OFFSET and friends)
    pub fn values_with(&self, extra: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut out = self.values.clone();
        out.extend(extra);
        out
    }
}

/// `%term%` with LIKE wildcards escaped; pair with `ESCAPE '\'`
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Trimmed search term, `None` when blank
pub fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Exact sum of a decimal TEXT column; the query must select it first
pub fn sum_decimal(conn: &Connection, sql: &str, values: &[Value]) -> AdminResult<Decimal> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| opt_decimal_at(row, 0))?;

    let mut total = Decimal::ZERO;
    for value in rows {
        if let Some(v) = value? {
            total = add_decimal(total, v)?;
        }
    }
    Ok(total)
}

pub fn count(conn: &Connection, sql: &str, values: &[Value]) -> AdminResult<u64> {
    let n: i64 = conn.query_row(sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

/// Date filter bound as unix seconds
///
/// Accepts RFC 3339 or `YYYY-MM-DD`. A bare end date covers the whole day.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> AdminResult<i64> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.timestamp());
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AdminError::InvalidFilter(format!("invalid date '{}'", raw)))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| AdminError::InvalidFilter(format!("invalid date '{}'", raw)))?;

    Ok(date.and_time(time).and_utc().timestamp())
}

/// UTC calendar day of a unix timestamp
pub fn day_of(ts: i64) -> AdminResult<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| AdminError::Corrupt(format!("timestamp {} out of range", ts)))
}

/// Unix seconds at 00:00 UTC of `day`
pub fn start_of_day(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Commission rate and SOL fee share are fractions in `0..=1`
pub fn validate_rate(field: &str, value: Option<f64>) -> AdminResult<()> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=1.0).contains(&v) => Err(AdminError::bad_request(
            format!("{} must be between 0 and 1, got {}", field, v),
        )),
        _ => Ok(()),
    }
}
