//! Domain records read from the store
//!
//! Monetary SOL values use `Decimal` end to end. Timestamps are unix seconds.

use crate::error::AdminError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type PlayerId = String;

/// Commission rate a plain USER carries
pub const DEFAULT_COMMISSION_RATE: f64 = 0.3;

/// SOL fee share a plain USER carries
pub const DEFAULT_SOL_FEE_SHARE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Kol,
    Bd,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Kol => "KOL",
            Role::Bd => "BD",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "KOL" => Ok(Role::Kol),
            "BD" => Ok(Role::Bd),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AdminError::InvalidFilter(format!("unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a transaction log row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxDirection {
    In,
    Out,
}

impl TxDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxDirection::In => "IN",
            TxDirection::Out => "OUT",
        }
    }
}

impl FromStr for TxDirection {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IN" => Ok(TxDirection::In),
            "OUT" => Ok(TxDirection::Out),
            other => Err(AdminError::InvalidFilter(format!("unknown direction '{}'", other))),
        }
    }
}

/// Business event that produced a transaction log row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxMethod {
    Mining,
    PassiveIncome,
    ReferralReward,
    Claim,
    SolFeeShare,
}

impl TxMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxMethod::Mining => "MINING",
            TxMethod::PassiveIncome => "PASSIVE_INCOME",
            TxMethod::ReferralReward => "REFERRAL_REWARD",
            TxMethod::Claim => "CLAIM",
            TxMethod::SolFeeShare => "SOL_FEE_SHARE",
        }
    }

    /// Methods that mint new $MINE into a player balance
    pub fn minting() -> [TxMethod; 3] {
        [TxMethod::Mining, TxMethod::PassiveIncome, TxMethod::ReferralReward]
    }
}

impl FromStr for TxMethod {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MINING" => Ok(TxMethod::Mining),
            "PASSIVE_INCOME" => Ok(TxMethod::PassiveIncome),
            "REFERRAL_REWARD" => Ok(TxMethod::ReferralReward),
            "CLAIM" => Ok(TxMethod::Claim),
            "SOL_FEE_SHARE" => Ok(TxMethod::SolFeeShare),
            other => Err(AdminError::InvalidFilter(format!("unknown method '{}'", other))),
        }
    }
}

impl fmt::Display for TxMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "PENDING",
            TxStatus::Success => "SUCCESS",
            TxStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for TxStatus {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(TxStatus::Pending),
            "SUCCESS" => Ok(TxStatus::Success),
            "FAILED" => Ok(TxStatus::Failed),
            other => Err(AdminError::InvalidFilter(format!("unknown status '{}'", other))),
        }
    }
}

/// A player row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub uuid: PlayerId,
    pub username: Option<String>,
    pub solana_address: Option<String>,
    pub role: Role,
    pub managed_by: Option<PlayerId>,
    pub referred_by: Option<PlayerId>,
    pub ref_code: Option<String>,
    pub mine_balance: i64,
    pub sol_balance: Decimal,
    pub total_ref_reward: i64,
    pub total_referred: i64,
    pub all_referred: i64,
    pub commission_rate: f64,
    pub sol_fee_share: f64,
    pub total_sol_share: Decimal,
    pub total_payout: Decimal,
    pub last_login: Option<i64>,
}

/// A transaction log row, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLog {
    pub id: i64,
    pub player_uuid: PlayerId,
    pub direction: TxDirection,
    pub method: TxMethod,
    pub amount: i64,
    pub sol_amount: Option<Decimal>,
    pub transaction_hash: Option<String>,
    pub status: TxStatus,
    pub source_player_uuid: Option<PlayerId>,
    pub created_at: i64,
}

/// A payout made to a KOL or BD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionLog {
    pub id: i64,
    pub kol_uuid: PlayerId,
    pub sol_amount: Decimal,
    pub mine_amount: i64,
    pub asset: String,
    pub status: String,
    pub transaction_hash: Option<String>,
    pub paid_by: Option<String>,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Referral edge: `referred` was brought in by `referrer`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferralEdge {
    pub referrer: PlayerId,
    pub referred: PlayerId,
}

/// Parse a decimal stored as TEXT
pub fn parse_decimal(raw: &str) -> Result<Decimal, AdminError> {
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|e| AdminError::Corrupt(format!("decimal '{}': {}", raw, e)))
}
