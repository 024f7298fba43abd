//! Admin services: dashboard, transactions, users, KOLs, BD team, KOL self-view
//!
//! Each service wraps a `SqliteGateway` clone. KOL and BD volumes go through the
//! reporting facade so they share the downstream-volume semantics.

pub mod bd_team;
pub mod dashboard;
pub mod kol_dashboard;
pub mod kols;
pub mod query;
pub mod transactions;
pub mod users;

pub use bd_team::BdTeamService;
pub use dashboard::DashboardService;
pub use kol_dashboard::KolDashboardService;
pub use kols::KolService;
pub use transactions::TransactionService;
pub use users::UserService;

use crate::error::{AdminError, AdminResult};
use crate::gateway::rows::{player_columns, player_from_row};
use crate::model::{Player, Role};
use query::validate_rate;
use rusqlite::{Connection, OptionalExtension};
use serde::Deserialize;

/// Promote an existing player, found by username or ref code
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub username: Option<String>,
    pub ref_code: Option<String>,
    pub managed_by_uuid: Option<String>,
    pub commission_rate: Option<f64>,
    pub sol_fee_share: Option<f64>,
}

/// Partial update of a KOL or BD; absent fields stay untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub managed_by_uuid: Option<String>,
    pub commission_rate: Option<f64>,
    pub sol_fee_share: Option<f64>,
}

impl PromoteRequest {
    fn validate(&self) -> AdminResult<()> {
        let has = |v: &Option<String>| v.as_deref().map(str::trim).is_some_and(|s| !s.is_empty());
        if !has(&self.username) && !has(&self.ref_code) {
            return Err(AdminError::bad_request(
                "either username or refCode must be provided",
            ));
        }
        validate_rate("commissionRate", self.commission_rate)?;
        validate_rate("solFeeShare", self.sol_fee_share)
    }
}

impl MemberUpdate {
    fn validate(&self) -> AdminResult<()> {
        validate_rate("commissionRate", self.commission_rate)?;
        validate_rate("solFeeShare", self.sol_fee_share)
    }
}

pub(crate) fn load_player(conn: &Connection, uuid: &str) -> AdminResult<Option<Player>> {
    let sql = format!("SELECT {} FROM players WHERE uuid = ?1", player_columns(None));
    Ok(conn.query_row(&sql, [uuid], player_from_row).optional()?)
}

/// Player `uuid` holding `role`, or NotFound(`what`)
pub(crate) fn require_member(
    conn: &Connection,
    uuid: &str,
    role: Role,
    what: &str,
) -> AdminResult<Player> {
    match load_player(conn, uuid)? {
        Some(p) if p.role == role => Ok(p),
        _ => Err(AdminError::not_found(what)),
    }
}

/// Username takes precedence over ref code
fn find_promotion_target(conn: &Connection, req: &PromoteRequest) -> AdminResult<Player> {
    let username = req.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (column, value) = match username {
        Some(name) => ("username", name),
        None => ("ref_code", req.ref_code.as_deref().map(str::trim).unwrap_or_default()),
    };

    let sql = format!(
        "SELECT {} FROM players WHERE {} = ?1",
        player_columns(None),
        column
    );
    conn.query_row(&sql, [value], player_from_row)
        .optional()?
        .ok_or_else(|| AdminError::not_found("User"))
}

/// Role, manager and rates written back in one statement
fn save_membership(conn: &Connection, player: &Player) -> AdminResult<()> {
    conn.execute(
        "UPDATE players
         SET role = ?1, managed_by_uuid = ?2, commission_rate = ?3, sol_fee_share = ?4
         WHERE uuid = ?5",
        rusqlite::params![
            player.role.as_str(),
            player.managed_by,
            player.commission_rate,
            player.sol_fee_share,
            player.uuid,
        ],
    )?;
    Ok(())
}

/// Shared promotion flow for KOL and BD
fn promote(conn: &Connection, req: &PromoteRequest, role: Role) -> AdminResult<Player> {
    req.validate()?;

    let mut player = find_promotion_target(conn, req)?;
    if player.role == role {
        return Err(AdminError::bad_request(format!("User is already a {}", role)));
    }

    player.role = role;
    if role == Role::Bd {
        player.managed_by = None;
    }
    if let Some(manager) = req.managed_by_uuid.as_deref() {
        require_member(conn, manager, Role::Bd, "BD manager")?;
        player.managed_by = Some(manager.to_string());
    }
    if let Some(rate) = req.commission_rate {
        player.commission_rate = rate;
    }
    if let Some(share) = req.sol_fee_share {
        player.sol_fee_share = share;
    }

    save_membership(conn, &player)?;
    log::info!("✅ Promoted {} to {}", player.uuid, role);
    Ok(player)
}

fn update_member(
    conn: &Connection,
    uuid: &str,
    role: Role,
    what: &str,
    update: &MemberUpdate,
) -> AdminResult<Player> {
    update.validate()?;

    let mut player = require_member(conn, uuid, role, what)?;
    if let Some(manager) = update.managed_by_uuid.as_deref() {
        require_member(conn, manager, Role::Bd, "BD manager")?;
        player.managed_by = Some(manager.to_string());
    }
    if let Some(rate) = update.commission_rate {
        player.commission_rate = rate;
    }
    if let Some(share) = update.sol_fee_share {
        player.sol_fee_share = share;
    }

    save_membership(conn, &player)?;
    log::info!("✅ Updated {} {}", what, uuid);
    Ok(player)
}

/// Back to a plain USER with default rates and no manager
fn demote(conn: &Connection, player: &mut Player) -> AdminResult<()> {
    player.role = Role::User;
    player.managed_by = None;
    player.commission_rate = crate::model::DEFAULT_COMMISSION_RATE;
    player.sol_fee_share = crate::model::DEFAULT_SOL_FEE_SHARE;
    save_membership(conn, player)
}
