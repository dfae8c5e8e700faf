use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::watch;

use crate::leave::clock::FixedClock;
use crate::leave::domain::{
    BalanceKey, CategoryId, EmployeeEntry, EmployeeId, LeaveBalance, LeaveCategory, LeaveRequest,
    LeaveRequestId, RequestFilter,
};
use crate::leave::store::{
    InMemoryLeaveStore, LeaveStore, LeaveTransaction, StoreError, Transactor,
};
use crate::leave::{HolidayCalendar, LeaveService};

pub(super) const ANNUAL: &str = "annuel";

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn employee(id: &str) -> EmployeeId {
    EmployeeId(id.to_string())
}

pub(super) fn annual() -> CategoryId {
    CategoryId(ANNUAL.to_string())
}

pub(super) fn annual_key(employee_id: &str, year: i32) -> BalanceKey {
    BalanceKey::new(employee(employee_id), annual(), year)
}

pub(super) fn manager() -> EmployeeId {
    employee("M1")
}

/// Hired 2024-05-01: eight months worked in 2024, no seniority bonus.
pub(super) fn may_hire() -> NaiveDate {
    date(2024, 5, 1)
}

pub(super) fn no_holidays() -> HolidayCalendar {
    HolidayCalendar::new()
}

pub(super) fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0)
            .single()
            .expect("valid instant"),
    ))
}

pub(super) fn build_service() -> (Arc<InMemoryLeaveStore>, LeaveService<InMemoryLeaveStore>) {
    let store = Arc::new(InMemoryLeaveStore::new());
    let service = LeaveService::with_clock(Arc::clone(&store), fixed_clock());
    (store, service)
}

/// Seeds `employee_id` for 2024 from the May hire date, leaving eight days available.
pub(super) fn seed_eight_days(service: &LeaveService<InMemoryLeaveStore>, employee_id: &str) {
    let report = service.seed_annual_allocations(
        &[EmployeeEntry {
            employee_id: employee(employee_id),
            entry_date: may_hire(),
        }],
        2024,
        &annual(),
    );
    assert!(report.failures.is_empty(), "seeding failed: {report:?}");
    assert_eq!(report.seeded[0].available, 8);
}

/// July 2024 request; the 1st is a Monday.
pub(super) fn july_request(
    service: &LeaveService<InMemoryLeaveStore>,
    employee_id: &str,
    start_day: u32,
    end_day: u32,
) -> LeaveRequest {
    service
        .request_leave(
            employee(employee_id),
            annual(),
            date(2024, 7, start_day),
            date(2024, 7, end_day),
            &no_holidays(),
        )
        .expect("request is recorded")
}

pub(super) fn stored_balance(store: &InMemoryLeaveStore, key: &BalanceKey) -> LeaveBalance {
    store
        .fetch_balance(key)
        .expect("fetch succeeds")
        .expect("balance present")
}

pub(super) fn stored_request(store: &InMemoryLeaveStore, id: &LeaveRequestId) -> LeaveRequest {
    store
        .fetch_request(id)
        .expect("fetch succeeds")
        .expect("request present")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every operation fails, for exercising infrastructure error paths.
pub(super) struct UnavailableStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("store offline".to_string())
}

impl Transactor for UnavailableStore {
    fn run_in_transaction<T, E, F>(&self, _body: F) -> Result<T, E>
    where
        F: FnMut(&mut dyn LeaveTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        Err(unavailable().into())
    }
}

impl LeaveStore for UnavailableStore {
    fn insert_request(&self, _request: LeaveRequest) -> Result<LeaveRequest, StoreError> {
        Err(unavailable())
    }

    fn fetch_request(&self, _id: &LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError> {
        Err(unavailable())
    }

    fn list_requests(&self, _filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        Err(unavailable())
    }

    fn fetch_balance(&self, _key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        Err(unavailable())
    }

    fn list_balances(
        &self,
        _employee_id: Option<&EmployeeId>,
    ) -> Result<Vec<LeaveBalance>, StoreError> {
        Err(unavailable())
    }

    fn insert_category(&self, _category: LeaveCategory) -> Result<LeaveCategory, StoreError> {
        Err(unavailable())
    }

    fn update_category(&self, _category: LeaveCategory) -> Result<LeaveCategory, StoreError> {
        Err(unavailable())
    }

    fn fetch_category(&self, _id: &CategoryId) -> Result<Option<LeaveCategory>, StoreError> {
        Err(unavailable())
    }

    fn list_categories(&self) -> Result<Vec<LeaveCategory>, StoreError> {
        Err(unavailable())
    }

    fn delete_category(&self, _id: &CategoryId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        watch::channel(0).1
    }
}
