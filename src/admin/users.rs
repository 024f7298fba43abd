//! User board

use super::query::{count, like_pattern, search_term, sum_decimal, WhereBuilder};
use super::load_player;
use crate::error::{AdminError, AdminResult};
use crate::gateway::rows::{player_columns, player_from_row, transaction_columns, transaction_from_row};
use crate::gateway::SqliteGateway;
use crate::model::{Player, PlayerId, Role, TransactionLog};
use crate::reporting::{Page, PageRequest, SortDirection};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    /// Substring of username or wallet
    pub search: Option<String>,
    /// A role name, or `all`
    pub status: Option<String>,
    /// `ASC` or `DESC` on total SOL share
    pub volume: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub regular_users: u64,
    pub kols: u64,
    pub bd_members: u64,
    pub total_mine_balance: i64,
    pub total_sol_balance: Decimal,
}

/// A player this user referred, with when the referral happened
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReferral {
    pub uuid: PlayerId,
    pub username: Option<String>,
    pub mine_balance: i64,
    pub last_login: Option<i64>,
    pub referred_at: i64,
}

#[derive(Clone)]
pub struct UserService {
    store: SqliteGateway,
}

impl UserService {
    pub fn new(store: SqliteGateway) -> Self {
        Self { store }
    }

    pub fn find_all(&self, query: &UserQuery, page: PageRequest) -> AdminResult<Page<Player>> {
        let mut filter = WhereBuilder::new();

        if let Some(term) = search_term(query.search.as_deref()) {
            let pattern = like_pattern(term);
            filter.push(
                "(username LIKE ? ESCAPE '\\' OR solana_address LIKE ? ESCAPE '\\')",
                [Value::Text(pattern.clone()), Value::Text(pattern)],
            );
        }

        match search_term(query.status.as_deref()) {
            Some(status) if !status.eq_ignore_ascii_case("all") => {
                let role: Role = status.parse()?;
                filter.push("role = ?", [Value::Text(role.as_str().to_string())]);
            }
            _ => {}
        }

        let direction = SortDirection::parse_or_default(query.volume.as_deref());

        self.store.with_conn(|conn| {
            let total = count(
                conn,
                &format!("SELECT COUNT(*) FROM players{}", filter.sql()),
                filter.values(),
            )?;

            // REAL cast is for ordering only; values are read back as TEXT
            let sql = format!(
                "SELECT {} FROM players{}
                 ORDER BY CAST(total_sol_share AS REAL) {}, uuid ASC
                 LIMIT ? OFFSET ?",
                player_columns(None),
                filter.sql(),
                direction.as_sql()
            );
            let values = filter.values_with([
                Value::Integer(page.limit() as i64),
                Value::Integer(page.offset() as i64),
            ]);

            let mut stmt = conn.prepare(&sql)?;
            let data = stmt
                .query_map(params_from_iter(values.iter()), player_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Page::new(data, total, page))
        })
    }

    pub fn find_one(&self, uuid: &str) -> AdminResult<Player> {
        self.store
            .with_conn(|conn| load_player(conn, uuid))?
            .ok_or_else(|| AdminError::not_found("User"))
    }

    /// Head counts per role plus the summed balances
    pub fn stats(&self) -> AdminResult<UserStats> {
        self.store.with_conn(|conn| {
            let (total_users, regular_users, kols, bd_members, total_mine_balance): (i64, i64, i64, i64, i64) =
                conn.query_row(
                    "SELECT COUNT(*),
                            COUNT(CASE WHEN role = ?1 THEN 1 END),
                            COUNT(CASE WHEN role = ?2 THEN 1 END),
                            COUNT(CASE WHEN role = ?3 THEN 1 END),
                            COALESCE(SUM(mine_balance), 0)
                     FROM players",
                    [Role::User.as_str(), Role::Kol.as_str(), Role::Bd.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                )?;

            let total_sol_balance = sum_decimal(conn, "SELECT sol_balance FROM players", &[])?;

            Ok(UserStats {
                total_users: total_users.max(0) as u64,
                regular_users: regular_users.max(0) as u64,
                kols: kols.max(0) as u64,
                bd_members: bd_members.max(0) as u64,
                total_mine_balance,
                total_sol_balance,
            })
        })
    }

    /// The user's newest `limit` transactions
    pub fn transactions(&self, uuid: &str, limit: i64) -> AdminResult<Vec<TransactionLog>> {
        if limit < 1 {
            return Err(AdminError::InvalidPagination(format!(
                "limit must be > 0, got {}",
                limit
            )));
        }

        self.store.with_conn(|conn| {
            require_user(conn, uuid)?;

            let sql = format!(
                "SELECT {} FROM transaction_logs WHERE player_uuid = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
                transaction_columns(None)
            );
            let mut stmt = conn.prepare(&sql)?;
            let logs = stmt
                .query_map(rusqlite::params![uuid, limit], transaction_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(logs)
        })
    }

    /// Players the user referred, newest referral first
    pub fn referrals(&self, uuid: &str) -> AdminResult<Vec<UserReferral>> {
        self.store.with_conn(|conn| {
            require_user(conn, uuid)?;

            let mut stmt = conn.prepare(
                "SELECT p.uuid, p.username, p.mine_balance, p.last_login, rl.created_at
                 FROM ref_logs rl JOIN players p ON p.uuid = rl.referred_uuid
                 WHERE rl.referrer_uuid = ?1
                 ORDER BY rl.created_at DESC, rl.id DESC",
            )?;
            let referrals = stmt
                .query_map([uuid], |row| {
                    Ok(UserReferral {
                        uuid: row.get(0)?,
                        username: row.get(1)?,
                        mine_balance: row.get(2)?,
                        last_login: row.get(3)?,
                        referred_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(referrals)
        })
    }
}

fn require_user(conn: &Connection, uuid: &str) -> AdminResult<Player> {
    load_player(conn, uuid)?.ok_or_else(|| AdminError::not_found("User"))
}
