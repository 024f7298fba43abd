//! Row mappers shared by the gateway and the admin services

use crate::error::{AdminError, AdminResult};
use crate::model::{CommissionLog, Player, TransactionLog};
use rusqlite::types::{Type, ValueRef};
use rusqlite::Row;
use rust_decimal::Decimal;
use std::str::FromStr;

const PLAYER_FIELDS: [&str; 17] = [
    "uuid",
    "username",
    "solana_address",
    "role",
    "managed_by_uuid",
    "referred_by",
    "ref_code",
    "mine_balance",
    "sol_balance",
    "total_ref_reward",
    "total_referred",
    "all_referred",
    "commission_rate",
    "sol_fee_share",
    "total_sol_share",
    "total_payout",
    "last_login",
];

const TRANSACTION_FIELDS: [&str; 10] = [
    "id",
    "player_uuid",
    "transaction_type",
    "method",
    "COALESCE(amount, 0)",
    "sol_amount",
    "transaction_hash",
    "status",
    "source_player_uuid",
    "created_at",
];

pub const COMMISSION_COLUMNS: &str = "id, kol_uuid, sol_amount, mine_amount, asset, status, \
     transaction_hash, paid_by, note, created_at";

fn qualified(fields: &[&str], alias: &str) -> String {
    fields
        .iter()
        .map(|f| match f.strip_prefix("COALESCE(") {
            Some(rest) => format!("COALESCE({}.{}", alias, rest),
            None => format!("{}.{}", alias, f),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Player column list for `player_from_row`, optionally table-qualified
pub fn player_columns(alias: Option<&str>) -> String {
    match alias {
        Some(alias) => qualified(&PLAYER_FIELDS, alias),
        None => PLAYER_FIELDS.join(", "),
    }
}

/// Transaction column list for `transaction_from_row`, optionally table-qualified
pub fn transaction_columns(alias: Option<&str>) -> String {
    match alias {
        Some(alias) => qualified(&TRANSACTION_FIELDS, alias),
        None => TRANSACTION_FIELDS.join(", "),
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a decimal that may have been written as TEXT, INTEGER or REAL
pub fn opt_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(Decimal::from(i))),
        ValueRef::Real(f) => Decimal::try_from(f)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| conversion_error(idx, e))?;
            crate::model::parse_decimal(text)
                .map(Some)
                .map_err(|e| conversion_error(idx, e))
        }
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            Type::Blob,
        )),
    }
}

/// Like `opt_decimal_at`, with NULL read as zero
pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    Ok(opt_decimal_at(row, idx)?.unwrap_or(Decimal::ZERO))
}

/// Running-total addition; a sum past `Decimal::MAX` means the stored values are bad
pub fn add_decimal(total: Decimal, value: Decimal) -> AdminResult<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| AdminError::Corrupt(format!("decimal overflow adding {} to {}", value, total)))
}

/// Parse an enum stored as TEXT
pub fn enum_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = AdminError>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

pub fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        uuid: row.get(0)?,
        username: row.get(1)?,
        solana_address: row.get(2)?,
        role: enum_at(row, 3)?,
        managed_by: row.get(4)?,
        referred_by: row.get(5)?,
        ref_code: row.get(6)?,
        mine_balance: row.get(7)?,
        sol_balance: decimal_at(row, 8)?,
        total_ref_reward: row.get(9)?,
        total_referred: row.get(10)?,
        all_referred: row.get(11)?,
        commission_rate: row.get(12)?,
        sol_fee_share: row.get(13)?,
        total_sol_share: decimal_at(row, 14)?,
        total_payout: decimal_at(row, 15)?,
        last_login: row.get(16)?,
    })
}

pub fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionLog> {
    Ok(TransactionLog {
        id: row.get(0)?,
        player_uuid: row.get(1)?,
        direction: enum_at(row, 2)?,
        method: enum_at(row, 3)?,
        amount: row.get(4)?,
        sol_amount: opt_decimal_at(row, 5)?,
        transaction_hash: row.get(6)?,
        status: enum_at(row, 7)?,
        source_player_uuid: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub fn commission_from_row(row: &Row<'_>) -> rusqlite::Result<CommissionLog> {
    Ok(CommissionLog {
        id: row.get(0)?,
        kol_uuid: row.get(1)?,
        sol_amount: decimal_at(row, 2)?,
        mine_amount: row.get(3)?,
        asset: row.get(4)?,
        status: row.get(5)?,
        transaction_hash: row.get(6)?,
        paid_by: row.get(7)?,
        note: row.get(8)?,
        created_at: row.get(9)?,
    })
}
