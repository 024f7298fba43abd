//! HTTP surface for the admin backend
//!
//! ```text
//! /health
//! /admin/reports/{downstream-volume/:uuid, top-performer}
//! /admin/dashboard/{stats, sol-revenue, user-growth, recent-transactions}
//! /admin/transactions[/stats]
//! /admin/users[/stats | /:uuid[/transactions | /referrals]]
//! /admin/kols[/stats | /bd-managers | /:uuid[/earnings]]
//! /admin/bd-team[/:uuid[/kols | /performance]]
//! /kol-dashboard/:uuid/{stats, referral-growth, commission-breakdown, top-referrals, commission-history}
//! ```

pub mod error;
pub mod extract;
pub mod handlers;

use crate::admin::{
    BdTeamService, DashboardService, KolDashboardService, KolService, TransactionService,
    UserService,
};
use crate::config::AdminConfig;
use crate::gateway::SqliteGateway;
use crate::reporting::ReportingFacade;
use axum::routing::get;
use axum::Router;
use handlers::*;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared handler state; every field is cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AdminConfig>,
    pub reporting: Arc<ReportingFacade>,
    pub dashboard: DashboardService,
    pub transactions: TransactionService,
    pub users: UserService,
    pub kols: KolService,
    pub bd_team: BdTeamService,
    pub kol_dashboard: KolDashboardService,
}

impl AppState {
    pub fn new(store: SqliteGateway, config: AdminConfig) -> Self {
        Self {
            config: Arc::new(config),
            reporting: Arc::new(ReportingFacade::new(Arc::new(store.clone()))),
            dashboard: DashboardService::new(store.clone()),
            transactions: TransactionService::new(store.clone()),
            users: UserService::new(store.clone()),
            kols: KolService::new(store.clone()),
            bd_team: BdTeamService::new(store.clone()),
            kol_dashboard: KolDashboardService::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;

    let admin = Router::new()
        .route("/reports/downstream-volume/:uuid", get(downstream_volume))
        .route("/reports/top-performer", get(top_performer))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/sol-revenue", get(dashboard_sol_revenue))
        .route("/dashboard/user-growth", get(dashboard_user_growth))
        .route("/dashboard/recent-transactions", get(dashboard_recent_transactions))
        .route("/transactions", get(transaction_list))
        .route("/transactions/stats", get(transaction_stats))
        .route("/users", get(user_list))
        .route("/users/stats", get(user_stats))
        .route("/users/:uuid", get(user_detail))
        .route("/users/:uuid/transactions", get(user_transactions))
        .route("/users/:uuid/referrals", get(user_referrals))
        .route("/kols", get(kol_list).post(kol_add))
        .route("/kols/stats", get(kol_stats))
        .route("/kols/bd-managers", get(kol_bd_managers))
        .route("/kols/:uuid", get(kol_detail).put(kol_update).delete(kol_remove))
        .route("/kols/:uuid/earnings", get(kol_earnings))
        .route("/bd-team", get(bd_list).post(bd_add))
        .route("/bd-team/:uuid", axum::routing::put(bd_update).delete(bd_remove))
        .route("/bd-team/:uuid/kols", get(bd_kols))
        .route("/bd-team/:uuid/performance", get(bd_performance));

    let kol_dashboard = Router::new()
        .route("/:uuid/stats", get(my_stats))
        .route("/:uuid/referral-growth", get(my_referral_growth))
        .route("/:uuid/commission-breakdown", get(my_commission_breakdown))
        .route("/:uuid/top-referrals", get(my_top_referrals))
        .route("/:uuid/commission-history", get(my_commission_history));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/admin", admin)
        .nest("/kol-dashboard", kol_dashboard)
        .with_state(state);

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::testing::store;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let db = store::open();
        store::player(&db, "bd1", Role::Bd, None);
        store::player(&db, "k1", Role::Kol, None);
        store::player(&db, "a", Role::User, Some("k1"));
        store::player(&db, "b", Role::User, Some("a"));
        store::player(&db, "cand", Role::User, None);
        store::mining(&db, "a", "0.000000001", 10);
        store::mining(&db, "b", "0.000000002", 11);
        store::tx(&db, "b", "IN", "CLAIM", Some(9), Some("5"), 12);

        router(AppState::new(db, AdminConfig::default()))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_downstream_volume_defaults_to_mining_sol() {
        let (status, body) = call(app(), "GET", "/admin/reports/downstream-volume/k1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["volume"], "0.000000003");

        let (_, body) = call(
            app(),
            "GET",
            "/admin/reports/downstream-volume/k1?method=CLAIM&column=token",
            None,
        )
        .await;
        assert_eq!(body["volume"], "9");
    }

    #[tokio::test]
    async fn test_unknown_method_is_400() {
        let (status, body) = call(
            app(),
            "GET",
            "/admin/reports/downstream-volume/k1?method=SOL_REVENUE",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(body["error"]["kind"], "INVALID_FILTER");
    }

    #[tokio::test]
    async fn test_top_performer_and_unknown_user() {
        let (status, body) = call(app(), "GET", "/admin/reports/top-performer?role=KOL&metric=volume", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "k1");

        let (status, body) = call(app(), "GET", "/admin/users/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "User not found");
    }

    #[tokio::test]
    async fn test_paginated_listing_rejects_page_zero() {
        let (status, body) = call(app(), "GET", "/admin/users?page=2&limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
        assert_eq!(body["lastPage"], 3);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, _) = call(app(), "GET", "/admin/transactions?page=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_kol_promotion_round_trip() {
        let app = app();
        let (status, body) = call(
            app.clone(),
            "POST",
            "/admin/kols",
            Some(r#"{"username":"cand_name","managedByUuid":"bd1","solFeeShare":0.2}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "KOL");

        let (_, kols) = call(app.clone(), "GET", "/admin/kols", None).await;
        assert_eq!(kols.as_array().unwrap().len(), 2);

        let (status, _) = call(app.clone(), "DELETE", "/admin/kols/cand", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(app, "DELETE", "/admin/kols/cand", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mistyped_query_uses_json_envelope() {
        let (status, body) = call(app(), "GET", "/admin/users?page=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(body["error"]["kind"], "INVALID_FILTER");

        let (status, body) = call(app(), "GET", "/admin/dashboard/user-growth?days=soon", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);

        let (status, body) = call(app(), "POST", "/admin/kols", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_user_drill_down_routes() {
        let (status, body) = call(app(), "GET", "/admin/users/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalUsers"], 5);
        assert_eq!(body["kols"], 1);
        assert_eq!(body["bdMembers"], 1);

        let (status, body) = call(app(), "GET", "/admin/users/b/transactions?limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let logs = body.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["createdAt"], 12);

        let (status, body) = call(app(), "GET", "/admin/users/k1/referrals", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = call(app(), "GET", "/admin/users/ghost/referrals", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_member_drill_down_routes() {
        let (status, body) = call(app(), "GET", "/admin/bd-team/bd1/kols", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = call(
            app(),
            "GET",
            "/admin/bd-team/bd1/performance?startDate=2024-03-01&endDate=2024-03-31",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app(), "GET", "/admin/kols/k1/earnings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, body) = call(app(), "GET", "/admin/kols/a/earnings", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);

        let (status, body) = call(app(), "GET", "/admin/dashboard/user-growth", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_kol_dashboard_routes() {
        let (status, body) = call(app(), "GET", "/kol-dashboard/k1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["yourReferralCode"], "REF_k1");

        let (status, body) = call(app(), "GET", "/kol-dashboard/k1/referral-growth", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 7);
    }
}
