use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::leave::router::{
    approve_handler, list_handler, request_handler, ApprovalPayload, LeaveRouterState,
    RequestQuery,
};
use crate::leave::{leave_router, HolidayCalendar, InMemoryLeaveStore, LeaveService};

fn router_with_service(service: LeaveService<InMemoryLeaveStore>) -> Router {
    leave_router(Arc::new(service), HolidayCalendar::new())
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_creates_pending_request() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/requests",
            json!({
                "employee_id": "E1",
                "category_id": "annuel",
                "start_date": "2024-07-01",
                "end_date": "2024-07-05",
                "holidays": ["2024-07-04"]
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["requested_days"], 4);
    assert!(body["id"].as_str().expect("id").starts_with("leave-"));
}

#[tokio::test]
async fn submit_route_rejects_reversed_dates() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/requests",
            json!({
                "employee_id": "E1",
                "category_id": "annuel",
                "start_date": "2024-07-05",
                "end_date": "2024-07-01"
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_route_rejects_separator_in_employee_id() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/requests",
            json!({
                "employee_id": "A_b",
                "category_id": "annuel",
                "start_date": "2024-07-01",
                "end_date": "2024-07-05"
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().expect("error").contains("'A_b'"));
}

#[tokio::test]
async fn submit_route_strips_time_from_holiday_timestamps() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/requests",
            json!({
                "employee_id": "E1",
                "category_id": "annuel",
                "start_date": "2024-07-01",
                "end_date": "2024-07-05",
                "holidays": ["2024-07-03T00:00:00Z", "2024-07-04T15:30:00+02:00"]
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["requested_days"], 3);
}

#[tokio::test]
async fn approve_route_returns_request_and_balance() {
    let (_, service) = build_service();
    seed_eight_days(&service, "E1");
    let request = july_request(&service, "E1", 1, 5);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/leave/requests/{}/approve", request.id),
            json!({ "approver_id": "M1", "employee_entry_date": "2024-05-01" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["request"]["approved_by"], "M1");
    assert_eq!(body["balance"]["id"], "E1_annuel_2024");
    assert_eq!(body["balance"]["used"], 5);
    assert_eq!(body["balance"]["available"], 3);
}

#[tokio::test]
async fn approve_handler_maps_insufficient_balance_to_unprocessable() {
    let (store, service) = build_service();
    seed_eight_days(&service, "E1");
    let request = july_request(&service, "E1", 1, 12);
    let state = LeaveRouterState::new(Arc::new(service), HolidayCalendar::new());

    let response = approve_handler::<InMemoryLeaveStore>(
        State(state),
        Path(request.id.0.clone()),
        axum::Json(ApprovalPayload {
            approver_id: manager(),
            employee_entry_date: may_hire(),
            holidays: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("insufficient balance"));
    assert_eq!(stored_balance(&store, &annual_key("E1", 2024)).used, 0);
}

#[tokio::test]
async fn approve_handler_returns_conflict_for_decided_request() {
    let (_, service) = build_service();
    let request = july_request(&service, "E1", 1, 2);
    service
        .reject(&request.id, &manager(), None)
        .expect("rejection succeeds");
    let state = LeaveRouterState::new(Arc::new(service), HolidayCalendar::new());

    let response = approve_handler::<InMemoryLeaveStore>(
        State(state),
        Path(request.id.0.clone()),
        axum::Json(ApprovalPayload {
            approver_id: manager(),
            employee_entry_date: may_hire(),
            holidays: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn request_handler_returns_not_found_for_unknown_id() {
    let (_, service) = build_service();
    let state = LeaveRouterState::new(Arc::new(service), HolidayCalendar::new());

    let response =
        request_handler::<InMemoryLeaveStore>(State(state), Path("leave-404".to_string())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_handler_returns_internal_error_when_store_is_down() {
    let service = LeaveService::with_clock(Arc::new(UnavailableStore), fixed_clock());
    let state = LeaveRouterState::new(Arc::new(service), HolidayCalendar::new());

    let response = list_handler::<UnavailableStore>(
        State(state),
        axum::extract::Query(RequestQuery {
            employee_id: None,
            status: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn list_route_filters_by_status() {
    let (_, service) = build_service();
    let kept = july_request(&service, "E1", 1, 2);
    let rejected = july_request(&service, "E1", 8, 9);
    service
        .reject(&rejected.id, &manager(), None)
        .expect("rejection succeeds");
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/leave/requests?employee_id=E1&status=pending"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let listed = body.as_array().expect("array payload");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], kept.id.0.as_str());
}

#[tokio::test]
async fn list_route_rejects_unknown_status() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/leave/requests?status=cancelled"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seed_then_read_balance_over_http() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let seeded = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/balances/seed",
            json!({
                "year": 2024,
                "category_id": "annuel",
                "employees": [{ "employee_id": "E1", "entry_date": "2020-06-01" }]
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(seeded.status(), StatusCode::OK);
    let report = read_json_body(seeded).await;
    assert_eq!(report["seeded"][0]["allocated"], 12);
    assert_eq!(report["failures"], json!([]));

    let response = router
        .oneshot(get("/api/v1/leave/balances/E1/annuel/2024"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["id"], "E1_annuel_2024");
    assert_eq!(body["available"], 12);
}

#[tokio::test]
async fn carry_over_route_sets_the_figure() {
    let (_, service) = build_service();
    seed_eight_days(&service, "E1");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/balances/carry-over",
            json!({ "employee_id": "E1", "category_id": "annuel", "year": 2024, "days": 2 }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["carried_over"], 2);
    assert_eq!(body["available"], 10);
}

#[tokio::test]
async fn missing_balance_is_not_found() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/leave/balances/E1/annuel/2024"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_routes_cover_create_conflict_and_delete() {
    let (_, service) = build_service();
    let router = router_with_service(service);
    let payload = json!({ "id": "maladie", "name": "Congé maladie", "paid": true });

    let created = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/leave/categories",
            payload.clone(),
        ))
        .await
        .expect("router responds");
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json_body(created).await;
    assert_eq!(body["annual_days"], Value::Null);

    let duplicate = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/leave/categories", payload))
        .await
        .expect("router responds");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let deleted = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/v1/leave/categories/maladie")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = router
        .oneshot(get("/api/v1/leave/categories/maladie"))
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn allocation_preview_reports_breakdown() {
    let (_, service) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/leave/allocation?entry_date=2019-01-01&year=2024"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["base_days"], 12);
    assert_eq!(body["bonus_days"], 1);
    assert_eq!(body["total"], 13);
}
