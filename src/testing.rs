//! In-memory gateway for unit tests of the reporting core

use crate::error::{AdminError, AdminResult};
use crate::gateway::{AmountColumn, PersistenceGateway, TransactionFilter};
use crate::model::{Player, PlayerId, ReferralEdge, Role, TxDirection, TxMethod, TxStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MemTx {
    pub player: PlayerId,
    pub method: TxMethod,
    pub status: TxStatus,
    pub direction: TxDirection,
    pub amount: Option<i64>,
    pub sol: Option<Decimal>,
}

#[derive(Default)]
pub struct MemoryGateway {
    players: Mutex<Vec<Player>>,
    txs: Mutex<Vec<MemTx>>,
    pub referral_lookups: AtomicUsize,
    pub sum_calls: AtomicUsize,
    pub fail_storage: std::sync::atomic::AtomicBool,
}

pub fn player(uuid: &str, role: Role, referred_by: Option<&str>) -> Player {
    Player {
        uuid: uuid.to_string(),
        username: Some(format!("{}_name", uuid)),
        solana_address: None,
        role,
        managed_by: None,
        referred_by: referred_by.map(str::to_string),
        ref_code: None,
        mine_balance: 0,
        sol_balance: Decimal::ZERO,
        total_ref_reward: 0,
        total_referred: 0,
        all_referred: 0,
        commission_rate: 0.3,
        sol_fee_share: 0.0,
        total_sol_share: Decimal::ZERO,
        total_payout: Decimal::ZERO,
        last_login: None,
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, p: Player) {
        self.players.lock().unwrap().push(p);
    }

    pub fn add(&self, uuid: &str, role: Role, referred_by: Option<&str>) {
        self.add_player(player(uuid, role, referred_by));
    }

    pub fn add_mining(&self, uuid: &str, sol: Decimal) {
        self.txs.lock().unwrap().push(MemTx {
            player: uuid.to_string(),
            method: TxMethod::Mining,
            status: TxStatus::Success,
            direction: TxDirection::In,
            amount: Some(1),
            sol: Some(sol),
        });
    }

    pub fn add_tx(&self, tx: MemTx) {
        self.txs.lock().unwrap().push(tx);
    }

    fn check(&self) -> AdminResult<()> {
        if self.fail_storage.load(Ordering::SeqCst) {
            return Err(AdminError::Storage(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn find_direct_referrals(&self, id: &str) -> AdminResult<Vec<PlayerId>> {
        self.check()?;
        self.referral_lookups.fetch_add(1, Ordering::SeqCst);
        let players = self.players.lock().unwrap();
        let mut out: Vec<PlayerId> = players
            .iter()
            .filter(|p| p.referred_by.as_deref() == Some(id))
            .map(|p| p.uuid.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    async fn load_referral_edges(&self) -> AdminResult<Vec<ReferralEdge>> {
        self.check()?;
        self.referral_lookups.fetch_add(1, Ordering::SeqCst);
        let players = self.players.lock().unwrap();
        Ok(players
            .iter()
            .filter_map(|p| {
                p.referred_by.as_ref().map(|r| ReferralEdge {
                    referrer: r.clone(),
                    referred: p.uuid.clone(),
                })
            })
            .collect())
    }

    async fn sum_transaction_amount(
        &self,
        ids: &HashSet<PlayerId>,
        filter: &TransactionFilter,
        column: AmountColumn,
    ) -> AdminResult<Option<Decimal>> {
        self.check()?;
        self.sum_calls.fetch_add(1, Ordering::SeqCst);
        let txs = self.txs.lock().unwrap();
        let mut total: Option<Decimal> = None;
        for tx in txs.iter() {
            if !ids.contains(&tx.player) || !filter.matches(tx.method, tx.status, tx.direction) {
                continue;
            }
            let value = match column {
                AmountColumn::Token => tx.amount.map(Decimal::from),
                AmountColumn::Sol => tx.sol,
            };
            if let Some(v) = value {
                total = Some(total.unwrap_or(Decimal::ZERO) + v);
            }
        }
        Ok(total)
    }

    async fn find_players_by_role(&self, role: Role) -> AdminResult<Vec<Player>> {
        self.check()?;
        let mut out: Vec<Player> = self
            .players
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.role == role)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(out)
    }
}

/// SQLite fixtures for the admin service tests
pub mod store {
    use crate::gateway::SqliteGateway;
    use crate::model::Role;
    use rusqlite::params;

    pub fn open() -> SqliteGateway {
        SqliteGateway::open_in_memory().unwrap()
    }

    /// username `<uuid>_name`, ref code `REF_<uuid>`, wallet `wallet_<uuid>`
    pub fn player(store: &SqliteGateway, uuid: &str, role: Role, referred_by: Option<&str>) {
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO players (uuid, username, solana_address, ref_code, referred_by, role)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        uuid,
                        format!("{}_name", uuid),
                        format!("wallet_{}", uuid),
                        format!("REF_{}", uuid),
                        referred_by,
                        role.as_str()
                    ],
                )?;
                Ok(())
            })
            .unwrap();
    }

    pub fn exec(store: &SqliteGateway, sql: &str, values: &[&dyn rusqlite::ToSql]) {
        store
            .with_conn(|conn| {
                conn.execute(sql, values)?;
                Ok(())
            })
            .unwrap();
    }

    pub fn tx(
        store: &SqliteGateway,
        player: &str,
        direction: &str,
        method: &str,
        amount: Option<i64>,
        sol: Option<&str>,
        created_at: i64,
    ) {
        exec(
            store,
            "INSERT INTO transaction_logs
                 (player_uuid, transaction_type, method, amount, sol_amount, transaction_hash, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'SUCCESS', ?7)",
            &[
                &player,
                &direction,
                &method,
                &amount,
                &sol,
                &format!("hash_{}_{}", player, created_at),
                &created_at,
            ],
        );
    }

    pub fn mining(store: &SqliteGateway, player: &str, sol: &str, created_at: i64) {
        tx(store, player, "IN", "MINING", Some(100), Some(sol), created_at);
    }

    pub fn ref_log(store: &SqliteGateway, referrer: &str, referred: &str, created_at: i64) {
        exec(
            store,
            "INSERT INTO ref_logs (referrer_uuid, referred_uuid, ref_code, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            &[&referrer, &referred, &format!("REF_{}", referrer), &created_at],
        );
    }

    pub fn commission(store: &SqliteGateway, kol: &str, sol: &str, mine: i64, created_at: i64) {
        exec(
            store,
            "INSERT INTO commission_logs (kol_uuid, sol_amount, mine_amount, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            &[&kol, &sol, &mine, &created_at],
        );
    }
}
