use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::allocation::allocation_breakdown;
use super::calendar::HolidayCalendar;
use super::categories::CategoryDraft;
use super::domain::{
    BalanceKey, BalanceView, CategoryId, EmployeeEntry, EmployeeId, LeaveRequestId, LeaveStatus,
    RequestFilter,
};
use super::error::LeaveServiceError;
use super::service::LeaveService;
use super::store::{LeaveStore, StoreError};

/// Shared handler state. `default_holidays` is used when a payload carries no calendar.
pub struct LeaveRouterState<S> {
    service: Arc<LeaveService<S>>,
    default_holidays: Arc<HolidayCalendar>,
}

impl<S> Clone for LeaveRouterState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            default_holidays: Arc::clone(&self.default_holidays),
        }
    }
}

impl<S> LeaveRouterState<S> {
    pub fn new(service: Arc<LeaveService<S>>, default_holidays: HolidayCalendar) -> Self {
        Self {
            service,
            default_holidays: Arc::new(default_holidays),
        }
    }

    fn holidays<'a>(&'a self, supplied: &'a Option<HolidayCalendar>) -> &'a HolidayCalendar {
        supplied.as_ref().unwrap_or(self.default_holidays.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaveSubmission {
    pub employee_id: EmployeeId,
    pub category_id: CategoryId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub holidays: Option<HolidayCalendar>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalPayload {
    pub approver_id: EmployeeId,
    pub employee_entry_date: NaiveDate,
    #[serde(default)]
    pub holidays: Option<HolidayCalendar>,
}

#[derive(Debug, Deserialize)]
pub struct RejectionPayload {
    pub approver_id: EmployeeId,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPayload {
    pub year: i32,
    pub category_id: CategoryId,
    pub employees: Vec<EmployeeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CarryOverPayload {
    pub employee_id: EmployeeId,
    pub category_id: CategoryId,
    pub year: i32,
    pub days: u32,
}

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub id: CategoryId,
    #[serde(flatten)]
    pub draft: CategoryDraft,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestQuery {
    pub employee_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllocationQuery {
    pub entry_date: NaiveDate,
    pub year: i32,
}

/// Router builder exposing the leave workflow over HTTP.
pub fn leave_router<S>(service: Arc<LeaveService<S>>, default_holidays: HolidayCalendar) -> Router
where
    S: LeaveStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/leave/requests",
            post(submit_handler::<S>).get(list_handler::<S>),
        )
        .route(
            "/api/v1/leave/requests/:request_id",
            get(request_handler::<S>),
        )
        .route(
            "/api/v1/leave/requests/:request_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/leave/requests/:request_id/reject",
            post(reject_handler::<S>),
        )
        .route("/api/v1/leave/balances", get(list_balances_handler::<S>))
        .route("/api/v1/leave/balances/seed", post(seed_handler::<S>))
        .route(
            "/api/v1/leave/balances/carry-over",
            post(carry_over_handler::<S>),
        )
        .route(
            "/api/v1/leave/balances/:employee_id/:category_id/:year",
            get(balance_handler::<S>),
        )
        .route(
            "/api/v1/leave/categories",
            post(create_category_handler::<S>).get(list_categories_handler::<S>),
        )
        .route(
            "/api/v1/leave/categories/:category_id",
            get(category_handler::<S>)
                .put(update_category_handler::<S>)
                .delete(delete_category_handler::<S>),
        )
        .route("/api/v1/leave/allocation", get(allocation_handler))
        .with_state(LeaveRouterState::new(service, default_holidays))
}

pub(crate) async fn submit_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Json(submission): Json<LeaveSubmission>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let holidays = state.holidays(&submission.holidays);
    match state.service.request_leave(
        submission.employee_id,
        submission.category_id,
        submission.start_date,
        submission.end_date,
        holidays,
    ) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Query(query): Query<RequestQuery>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let status = match query.status.as_deref() {
        Some(raw) => match LeaveStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let payload = json!({
                    "error": format!("unknown leave status '{raw}'"),
                });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        },
        None => None,
    };
    let filter = RequestFilter {
        employee_id: query.employee_id.map(EmployeeId),
        status,
    };

    match state.service.list_requests(&filter) {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn request_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path(request_id): Path<String>,
) -> Response
where
    S: LeaveStore + 'static,
{
    match state.service.get_request(&LeaveRequestId(request_id)) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path(request_id): Path<String>,
    Json(payload): Json<ApprovalPayload>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let holidays = state.holidays(&payload.holidays);
    match state.service.approve(
        &LeaveRequestId(request_id),
        &payload.approver_id,
        payload.employee_entry_date,
        holidays,
    ) {
        Ok(outcome) => {
            let body = json!({
                "request": outcome.request,
                "balance": outcome.balance.view(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path(request_id): Path<String>,
    Json(payload): Json<RejectionPayload>,
) -> Response
where
    S: LeaveStore + 'static,
{
    match state.service.reject(
        &LeaveRequestId(request_id),
        &payload.approver_id,
        payload.comment,
    ) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn seed_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Json(payload): Json<SeedPayload>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let report = state.service.seed_annual_allocations(
        &payload.employees,
        payload.year,
        &payload.category_id,
    );
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) async fn carry_over_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Json(payload): Json<CarryOverPayload>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let key = BalanceKey::new(payload.employee_id, payload.category_id, payload.year);
    match state.service.credit_carry_over(&key, payload.days) {
        Ok(balance) => (StatusCode::OK, Json(balance.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_balances_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Query(query): Query<BalanceQuery>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let employee_id = query.employee_id.map(EmployeeId);
    match state.service.list_balances(employee_id.as_ref()) {
        Ok(balances) => {
            let views: Vec<BalanceView> = balances.iter().map(|balance| balance.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn balance_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path((employee_id, category_id, year)): Path<(String, String, i32)>,
) -> Response
where
    S: LeaveStore + 'static,
{
    let key = BalanceKey::new(EmployeeId(employee_id), CategoryId(category_id), year);
    match state.service.get_balance(&key) {
        Ok(balance) => (StatusCode::OK, Json(balance.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_category_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Json(payload): Json<CategoryPayload>,
) -> Response
where
    S: LeaveStore + 'static,
{
    match state.service.categories().create(payload.id, payload.draft) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_categories_handler<S>(State(state): State<LeaveRouterState<S>>) -> Response
where
    S: LeaveStore + 'static,
{
    match state.service.categories().list() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn category_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path(category_id): Path<String>,
) -> Response
where
    S: LeaveStore + 'static,
{
    match state.service.categories().get(&CategoryId(category_id)) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_category_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path(category_id): Path<String>,
    Json(draft): Json<CategoryDraft>,
) -> Response
where
    S: LeaveStore + 'static,
{
    match state
        .service
        .categories()
        .update(CategoryId(category_id), draft)
    {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_category_handler<S>(
    State(state): State<LeaveRouterState<S>>,
    Path(category_id): Path<String>,
) -> Response
where
    S: LeaveStore + 'static,
{
    match state.service.categories().delete(&CategoryId(category_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn allocation_handler(Query(query): Query<AllocationQuery>) -> Response {
    let breakdown = allocation_breakdown(query.entry_date, query.year);
    (StatusCode::OK, Json(breakdown)).into_response()
}

pub(crate) fn error_status(error: &LeaveServiceError) -> StatusCode {
    match error {
        LeaveServiceError::NotFound { .. } | LeaveServiceError::Store(StoreError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        LeaveServiceError::InvalidState { .. }
        | LeaveServiceError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        LeaveServiceError::InsufficientBalance { .. }
        | LeaveServiceError::Overdrawn { .. }
        | LeaveServiceError::InvalidDateRange { .. }
        | LeaveServiceError::InvalidIdentifier { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LeaveServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: LeaveServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error_status(&error), Json(payload)).into_response()
}
