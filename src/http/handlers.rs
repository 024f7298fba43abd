//! Route handlers. Thin: parse, call a service, wrap in JSON.

use super::extract::{JsonBody, Query};
use super::AppState;
use crate::admin::bd_team::{BdPerformancePoint, BdSummary};
use crate::admin::dashboard::{DashboardStats, RecentTransaction, RevenuePoint, UserGrowthPoint};
use crate::admin::kol_dashboard::{CommissionBreakdown, GrowthPoint, KolDashboardStats, ReferralSpend};
use crate::admin::kols::{BdManagerRef, EarningsPoint, KolDetails, KolStats, KolSummary};
use crate::admin::transactions::{TransactionQuery, TransactionRow, TransactionStats};
use crate::admin::users::{UserQuery, UserReferral, UserStats};
use crate::admin::{MemberUpdate, PromoteRequest};
use crate::error::{AdminError, AdminResult};
use crate::gateway::{AmountColumn, TransactionFilter};
use crate::model::{CommissionLog, Player, PlayerId, Role, TransactionLog};
use crate::reporting::{mining_volume_filter, Page, PageRequest, PerformerMetric, TopPerformer};
use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DEFAULT_REVENUE_DAYS: i64 = 7;
const DEFAULT_RECENT_LIMIT: i64 = 5;
const DEFAULT_GROWTH_DAYS: i64 = 30;
const DEFAULT_USER_TX_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

/// Inclusive bounds, RFC 3339 or `YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VolumeQuery {
    /// Comma-separated methods; MINING when absent
    pub method: Option<String>,
    pub status: Option<String>,
    pub direction: Option<String>,
    /// `sol` (default) or `token`
    pub column: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopPerformerQuery {
    pub role: Option<String>,
    pub metric: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownstreamVolume {
    pub id: PlayerId,
    pub volume: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

fn page_request(state: &AppState, q: &PageQuery) -> AdminResult<PageRequest> {
    PageRequest::from_query(
        q.page,
        q.limit,
        state.config.default_page_limit,
        state.config.max_page_limit,
    )
}

fn parse_column(raw: Option<&str>) -> AdminResult<AmountColumn> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("sol") => Ok(AmountColumn::Sol),
        Some("token") => Ok(AmountColumn::Token),
        Some(other) => Err(AdminError::InvalidFilter(format!("unknown column '{}'", other))),
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---- reporting core ----

pub async fn downstream_volume(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(q): Query<VolumeQuery>,
) -> AdminResult<Json<DownstreamVolume>> {
    let column = parse_column(q.column.as_deref())?;
    let filter = match q.method.as_deref().map(str::trim) {
        None | Some("") => {
            let base = TransactionFilter::parse(None, q.status.as_deref(), q.direction.as_deref())?;
            let mut filter = mining_volume_filter();
            if let Some(status) = base.status() {
                filter = filter.with_status(status);
            }
            if let Some(direction) = base.direction() {
                filter = filter.with_direction(direction);
            }
            filter
        }
        Some(methods) => {
            TransactionFilter::parse(Some(methods), q.status.as_deref(), q.direction.as_deref())?
        }
    };

    let volume = state
        .reporting
        .get_downstream_volume_in(&uuid, &filter, column)
        .await?;
    Ok(Json(DownstreamVolume { id: uuid, volume }))
}

pub async fn top_performer(
    State(state): State<AppState>,
    Query(q): Query<TopPerformerQuery>,
) -> AdminResult<Json<Option<TopPerformer>>> {
    let role: Role = q.role.as_deref().unwrap_or("KOL").parse()?;
    let metric: PerformerMetric = q.metric.as_deref().unwrap_or("volume").parse()?;
    Ok(Json(state.reporting.get_top_performer(role, metric).await?))
}

// ---- dashboard ----

pub async fn dashboard_stats(State(state): State<AppState>) -> AdminResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard.stats()?))
}

pub async fn dashboard_sol_revenue(
    State(state): State<AppState>,
    Query(q): Query<DaysQuery>,
) -> AdminResult<Json<Vec<RevenuePoint>>> {
    let days = q.days.unwrap_or(DEFAULT_REVENUE_DAYS);
    Ok(Json(state.dashboard.sol_revenue_over_time(days)?))
}

pub async fn dashboard_user_growth(
    State(state): State<AppState>,
    Query(q): Query<DaysQuery>,
) -> AdminResult<Json<Vec<UserGrowthPoint>>> {
    let days = q.days.unwrap_or(DEFAULT_GROWTH_DAYS);
    Ok(Json(state.dashboard.user_growth(days)?))
}

pub async fn dashboard_recent_transactions(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> AdminResult<Json<Vec<RecentTransaction>>> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(state.config.max_page_limit as i64);
    Ok(Json(state.dashboard.recent_transactions(limit)?))
}

// ---- transactions ----

pub async fn transaction_stats(State(state): State<AppState>) -> AdminResult<Json<TransactionStats>> {
    Ok(Json(state.transactions.stats()?))
}

pub async fn transaction_list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(q): Query<TransactionQuery>,
) -> AdminResult<Json<Page<TransactionRow>>> {
    let page = page_request(&state, &page)?;
    Ok(Json(state.transactions.find_all(&q, page)?))
}

// ---- users ----

pub async fn user_list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(q): Query<UserQuery>,
) -> AdminResult<Json<Page<Player>>> {
    let page = page_request(&state, &page)?;
    Ok(Json(state.users.find_all(&q, page)?))
}

pub async fn user_detail(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<Player>> {
    Ok(Json(state.users.find_one(&uuid)?))
}

pub async fn user_stats(State(state): State<AppState>) -> AdminResult<Json<UserStats>> {
    Ok(Json(state.users.stats()?))
}

pub async fn user_transactions(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(q): Query<PageQuery>,
) -> AdminResult<Json<Vec<TransactionLog>>> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_USER_TX_LIMIT)
        .min(state.config.max_page_limit as i64);
    Ok(Json(state.users.transactions(&uuid, limit)?))
}

pub async fn user_referrals(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<Vec<UserReferral>>> {
    Ok(Json(state.users.referrals(&uuid)?))
}

// ---- KOLs ----

pub async fn kol_stats(State(state): State<AppState>) -> AdminResult<Json<KolStats>> {
    Ok(Json(state.kols.stats().await?))
}

pub async fn kol_bd_managers(State(state): State<AppState>) -> AdminResult<Json<Vec<BdManagerRef>>> {
    Ok(Json(state.kols.bd_managers()?))
}

pub async fn kol_list(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AdminResult<Json<Vec<KolSummary>>> {
    Ok(Json(state.kols.list(q.search.as_deref()).await?))
}

pub async fn kol_detail(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<KolDetails>> {
    Ok(Json(state.kols.details(&uuid).await?))
}

pub async fn kol_earnings(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(q): Query<DateRangeQuery>,
) -> AdminResult<Json<Vec<EarningsPoint>>> {
    Ok(Json(state.kols.earnings(
        &uuid,
        q.start_date.as_deref(),
        q.end_date.as_deref(),
    )?))
}

pub async fn kol_add(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PromoteRequest>,
) -> AdminResult<Json<Player>> {
    Ok(Json(state.kols.add_kol(&req)?))
}

pub async fn kol_update(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    JsonBody(update): JsonBody<MemberUpdate>,
) -> AdminResult<Json<Player>> {
    Ok(Json(state.kols.update_kol(&uuid, &update)?))
}

pub async fn kol_remove(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<Message>> {
    state.kols.remove_kol(&uuid)?;
    Ok(Json(Message {
        message: "KOL removed successfully".to_string(),
    }))
}

// ---- BD team ----

pub async fn bd_list(State(state): State<AppState>) -> AdminResult<Json<Vec<BdSummary>>> {
    Ok(Json(state.bd_team.list().await?))
}

pub async fn bd_kols(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<Vec<Player>>> {
    Ok(Json(state.bd_team.managed_kols(&uuid)?))
}

pub async fn bd_performance(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(q): Query<DateRangeQuery>,
) -> AdminResult<Json<Vec<BdPerformancePoint>>> {
    Ok(Json(state.bd_team.performance(
        &uuid,
        q.start_date.as_deref(),
        q.end_date.as_deref(),
    )?))
}

pub async fn bd_add(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PromoteRequest>,
) -> AdminResult<Json<Player>> {
    Ok(Json(state.bd_team.add_bd(&req)?))
}

pub async fn bd_update(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    JsonBody(update): JsonBody<MemberUpdate>,
) -> AdminResult<Json<Player>> {
    Ok(Json(state.bd_team.update_bd(&uuid, &update)?))
}

pub async fn bd_remove(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<Message>> {
    state.bd_team.remove_bd(&uuid)?;
    Ok(Json(Message {
        message: "BD member removed successfully".to_string(),
    }))
}

// ---- KOL self-service ----

pub async fn my_stats(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<KolDashboardStats>> {
    Ok(Json(state.kol_dashboard.stats(&uuid)?))
}

pub async fn my_referral_growth(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<Vec<GrowthPoint>>> {
    let today = chrono::Utc::now().date_naive();
    Ok(Json(state.kol_dashboard.referral_growth(&uuid, today)?))
}

pub async fn my_commission_breakdown(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AdminResult<Json<CommissionBreakdown>> {
    Ok(Json(state.kol_dashboard.commission_breakdown(&uuid)?))
}

pub async fn my_top_referrals(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(page): Query<PageQuery>,
) -> AdminResult<Json<Page<ReferralSpend>>> {
    let page = page_request(&state, &page)?;
    Ok(Json(state.kol_dashboard.top_referrals(&uuid, page)?))
}

pub async fn my_commission_history(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(page): Query<PageQuery>,
) -> AdminResult<Json<Page<CommissionLog>>> {
    let page = page_request(&state, &page)?;
    Ok(Json(state.kol_dashboard.commission_history(&uuid, page)?))
}
