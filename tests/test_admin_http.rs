//! End-to-end HTTP tests: router -> services -> SQLite file
//!
//! Seeds a migrated database, then drives the admin and KOL dashboard
//! routes through `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod admin_http_tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use minepath_admin::config::AdminConfig;
    use minepath_admin::gateway::SqliteGateway;
    use minepath_admin::http::{router, AppState};
    use rusqlite::params;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// BD `bd` manages KOL `kol`; `kol` -> `u1` -> `u2`, plus an unrelated `loner`
    fn seeded_store(dir: &TempDir) -> SqliteGateway {
        let store = SqliteGateway::open_with_embedded_schema(dir.path().join("admin.db")).unwrap();
        store
            .with_conn(|conn| {
                let players: [(&str, &str, Option<&str>, Option<&str>); 5] = [
                    ("bd", "BD", None, None),
                    ("kol", "KOL", None, Some("bd")),
                    ("u1", "USER", Some("kol"), None),
                    ("u2", "USER", Some("u1"), None),
                    ("loner", "USER", None, None),
                ];
                for (uuid, role, referred_by, managed_by) in players {
                    conn.execute(
                        "INSERT INTO players (uuid, username, solana_address, ref_code, role, referred_by, managed_by_uuid)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            uuid,
                            format!("{}_name", uuid),
                            format!("wallet_{}", uuid),
                            format!("REF_{}", uuid),
                            role,
                            referred_by,
                            managed_by
                        ],
                    )?;
                }

                let txs: [(&str, &str, &str, i64, &str); 4] = [
                    ("u1", "MINING", "SUCCESS", 100, "1.25"),
                    ("u2", "MINING", "SUCCESS", 100, "0.75"),
                    ("u2", "MINING", "FAILED", 100, "9"),
                    ("loner", "MINING", "SUCCESS", 100, "4"),
                ];
                for (i, (player, method, status, amount, sol)) in txs.iter().enumerate() {
                    conn.execute(
                        "INSERT INTO transaction_logs (player_uuid, transaction_type, method, amount, sol_amount, status, created_at)
                         VALUES (?1, 'IN', ?2, ?3, ?4, ?5, ?6)",
                        params![player, method, amount, sol, status, 1_700_000_000 + i as i64],
                    )?;
                }

                conn.execute(
                    "INSERT INTO ref_logs (referrer_uuid, referred_uuid, ref_code, created_at)
                     VALUES ('kol', 'u1', 'REF_kol', 1700000000)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        store
    }

    fn app(dir: &TempDir) -> Router {
        router(AppState::new(seeded_store(dir), AdminConfig::default()))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_downstream_volume_route() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        // 1. Default filter: MINING, any status
        let (status, body) = get(app.clone(), "/admin/reports/downstream-volume/kol").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "kol");
        assert_eq!(body["volume"], "11.00");

        // 2. Status narrows the sum
        let (_, body) = get(app.clone(), "/admin/reports/downstream-volume/kol?status=SUCCESS").await;
        assert_eq!(body["volume"], "2.00");

        // 3. Unknown root is zero, not 404
        let (status, body) = get(app.clone(), "/admin/reports/downstream-volume/ghost").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["volume"], "0");
    }

    #[tokio::test]
    async fn test_bd_team_volume_covers_managed_kols() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let (status, body) = get(app.clone(), "/admin/bd-team").await;
        assert_eq!(status, StatusCode::OK);

        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["uuid"], "bd");
        assert_eq!(rows[0]["kolsManaged"], 1);
        assert_eq!(rows[0]["totalVolumeGenerated"], "11.00");
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_client_errors() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, body) = get(app.clone(), "/admin/reports/top-performer?role=WHALE").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);

        let (status, _) = get(app.clone(), "/admin/users?limit=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(app.clone(), "/admin/users?page=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);

        let (status, body) = get(app.clone(), "/kol-dashboard/ghost/stats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);
    }

    #[tokio::test]
    async fn test_drill_downs_over_seeded_file() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, body) = get(app.clone(), "/admin/users/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalUsers"], 5);
        assert_eq!(body["regularUsers"], 3);

        let (_, body) = get(app.clone(), "/admin/users/u2/transactions").await;
        let logs = body.as_array().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["status"], "FAILED");

        let (_, body) = get(app.clone(), "/admin/users/kol/referrals").await;
        let referrals = body.as_array().unwrap();
        assert_eq!(referrals.len(), 1);
        assert_eq!(referrals[0]["uuid"], "u1");
        assert_eq!(referrals[0]["referredAt"], 1_700_000_000);

        let (status, body) = get(app.clone(), "/admin/bd-team/bd/kols").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["uuid"], "kol");
    }

    #[tokio::test]
    async fn test_transactions_listing_searches_by_wallet() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let (status, body) = get(app.clone(), "/admin/transactions?search=WALLET_U2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["page"], 1);
    }
}
