//! Integration tests for the referral volume aggregator against SQLite
//!
//! - Downstream resolution over real `players.referred_by` edges
//! - Exact SOL sums across the IN-clause chunk boundary
//! - Cycle tolerance
//! - Top performer selection on an on-disk database built from `sql/`

#[cfg(test)]
mod referral_reporting_tests {
    use minepath_admin::gateway::{run_schema_migrations, AmountColumn, SqliteGateway, TransactionFilter};
    use minepath_admin::model::{Role, TxMethod, TxStatus};
    use minepath_admin::reporting::{mining_volume_filter, PerformerMetric, ReportingFacade};
    use rusqlite::{params, Connection};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn insert_player(conn: &Connection, uuid: &str, role: &str, referred_by: Option<&str>) {
        conn.execute(
            "INSERT INTO players (uuid, username, role, referred_by) VALUES (?1, ?2, ?3, ?4)",
            params![uuid, format!("{}_name", uuid), role, referred_by],
        )
        .unwrap();
    }

    fn insert_tx(conn: &Connection, player: &str, method: &str, status: &str, amount: Option<i64>, sol: Option<&str>) {
        conn.execute(
            "INSERT INTO transaction_logs (player_uuid, transaction_type, method, amount, sol_amount, status, created_at)
             VALUES (?1, 'IN', ?2, ?3, ?4, ?5, 1700000000)",
            params![player, method, amount, sol, status],
        )
        .unwrap();
    }

    /// On-disk database migrated from the shipped schema files
    fn migrated_db() -> (NamedTempFile, Connection) {
        let file = NamedTempFile::new().unwrap();
        let mut conn = Connection::open(file.path()).unwrap();
        run_schema_migrations(&mut conn, "sql").unwrap();
        (file, conn)
    }

    fn facade_for(file: &NamedTempFile) -> ReportingFacade {
        let store = SqliteGateway::open(file.path()).unwrap();
        ReportingFacade::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_downstream_volume_over_sqlite() {
        let (file, conn) = migrated_db();
        insert_player(&conn, "R", "KOL", None);
        insert_player(&conn, "B", "USER", Some("R"));
        insert_player(&conn, "C", "USER", Some("R"));
        insert_player(&conn, "D", "USER", Some("B"));
        insert_tx(&conn, "B", "MINING", "SUCCESS", Some(1), Some("5"));
        insert_tx(&conn, "C", "MINING", "SUCCESS", Some(1), Some("3"));
        insert_tx(&conn, "D", "MINING", "SUCCESS", Some(1), Some("7"));
        insert_tx(&conn, "R", "MINING", "SUCCESS", Some(1), Some("100"));
        drop(conn);

        let facade = facade_for(&file);

        // the root's own spend is not downstream volume
        let volume = facade.get_downstream_volume("R", &mining_volume_filter()).await.unwrap();
        assert_eq!(volume, dec!(15));

        let leaf = facade.get_downstream_volume("D", &mining_volume_filter()).await.unwrap();
        assert_eq!(leaf, Decimal::ZERO);

        let unknown = facade.get_downstream_volume("nobody", &mining_volume_filter()).await.unwrap();
        assert_eq!(unknown, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_status_filter_and_token_column() {
        let (file, conn) = migrated_db();
        insert_player(&conn, "K", "KOL", None);
        insert_player(&conn, "u", "USER", Some("K"));
        insert_tx(&conn, "u", "MINING", "SUCCESS", Some(10), Some("0.5"));
        insert_tx(&conn, "u", "MINING", "FAILED", Some(20), Some("0.25"));
        insert_tx(&conn, "u", "MINING", "SUCCESS", None, None);
        drop(conn);

        let facade = facade_for(&file);

        let succeeded = TransactionFilter::method(TxMethod::Mining).with_status(TxStatus::Success);
        let sol = facade.get_downstream_volume("K", &succeeded).await.unwrap();
        assert_eq!(sol, dec!(0.5));

        let tokens = facade
            .get_downstream_volume_in("K", &mining_volume_filter(), AmountColumn::Token)
            .await
            .unwrap();
        assert_eq!(tokens, dec!(30));
    }

    #[tokio::test]
    async fn test_wide_tree_spans_multiple_chunks() {
        let (file, conn) = migrated_db();
        let tx = conn.unchecked_transaction().unwrap();
        insert_player(&tx, "root", "KOL", None);
        for i in 0..1200 {
            let id = format!("p{:04}", i);
            insert_player(&tx, &id, "USER", Some("root"));
            insert_tx(&tx, &id, "MINING", "SUCCESS", Some(1), Some("0.000000001"));
        }
        tx.commit().unwrap();
        drop(conn);

        let facade = facade_for(&file);
        let volume = facade.get_downstream_volume("root", &mining_volume_filter()).await.unwrap();
        assert_eq!(volume, dec!(0.0000012));

        let descendants = facade.resolver().resolve_descendants("root").await.unwrap();
        assert_eq!(descendants.len(), 1200);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let (file, conn) = migrated_db();
        insert_player(&conn, "A", "KOL", None);
        insert_player(&conn, "B", "USER", Some("A"));
        insert_player(&conn, "C", "USER", Some("B"));
        conn.execute("UPDATE players SET referred_by = 'C' WHERE uuid = 'A'", []).unwrap();
        insert_tx(&conn, "A", "MINING", "SUCCESS", Some(1), Some("1"));
        insert_tx(&conn, "B", "MINING", "SUCCESS", Some(1), Some("2"));
        insert_tx(&conn, "C", "MINING", "SUCCESS", Some(1), Some("4"));
        drop(conn);

        let facade = facade_for(&file);
        let descendants = facade.resolver().resolve_descendants("A").await.unwrap();
        assert_eq!(descendants.len(), 2);
        assert!(!descendants.contains("A"));

        let volume = facade.get_downstream_volume("A", &mining_volume_filter()).await.unwrap();
        assert_eq!(volume, dec!(6));

        // index-based cohort path agrees with the level-by-level walk
        let cohort = facade.cohort_volumes(Role::Kol, &mining_volume_filter()).await.unwrap();
        assert_eq!(cohort.len(), 1);
        assert_eq!(cohort[0].volume, dec!(6));
    }

    #[tokio::test]
    async fn test_top_performer_over_sqlite() {
        let (file, conn) = migrated_db();
        insert_player(&conn, "kol_b", "KOL", None);
        insert_player(&conn, "kol_a", "KOL", None);
        insert_player(&conn, "kol_idle", "KOL", None);
        insert_player(&conn, "x", "USER", Some("kol_b"));
        insert_player(&conn, "y", "USER", Some("kol_a"));
        insert_tx(&conn, "x", "MINING", "SUCCESS", Some(1), Some("1.50"));
        insert_tx(&conn, "y", "MINING", "SUCCESS", Some(1), Some("1.5"));
        conn.execute("UPDATE players SET all_referred = 12 WHERE uuid = 'kol_idle'", []).unwrap();
        drop(conn);

        let facade = facade_for(&file);

        let by_volume = facade
            .get_top_performer(Role::Kol, PerformerMetric::Volume)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_volume.id, "kol_a");
        assert_eq!(by_volume.metric_value, dec!(1.5));

        let by_referrals = facade
            .get_top_performer(Role::Kol, PerformerMetric::Referrals)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_referrals.id, "kol_idle");

        let no_bds = facade.get_top_performer(Role::Bd, PerformerMetric::Volume).await.unwrap();
        assert!(no_bds.is_none());
    }
}
