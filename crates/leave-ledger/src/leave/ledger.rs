use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::info;

use super::calendar::{business_days, HolidayCalendar};
use super::clock::Clock;
use super::domain::{
    CategoryId, EmployeeId, LeaveRequest, LeaveRequestId, LeaveStatus, RequestFilter,
};
use super::error::LeaveServiceError;
use super::store::{LeaveStore, StoreError};

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> LeaveRequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeaveRequestId(format!("leave-{id:06}"))
}

/// Creation and lookup of leave requests.
///
/// Creation is optimistic: the balance is not consulted, since it may be seeded, credited
/// or repaired before anyone approves. Sufficiency is enforced only at approval.
pub struct RequestLedger<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> RequestLedger<S>
where
    S: LeaveStore + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn create_request(
        &self,
        employee_id: EmployeeId,
        category_id: CategoryId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        holidays: &HolidayCalendar,
    ) -> Result<LeaveRequest, LeaveServiceError> {
        LeaveServiceError::ensure_employee_key(&employee_id)?;
        LeaveServiceError::ensure_category_key(&category_id)?;
        if end_date < start_date {
            return Err(LeaveServiceError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let request = LeaveRequest {
            id: next_request_id(),
            employee_id,
            category_id,
            start_date,
            end_date,
            status: LeaveStatus::Pending,
            requested_at: self.clock.now(),
            approved_by: None,
            approved_at: None,
            comment: None,
            requested_days: business_days(start_date, end_date, holidays),
        };

        let stored = self.store.insert_request(request)?;
        info!(
            request_id = %stored.id,
            employee_id = %stored.employee_id,
            requested_days = stored.requested_days,
            "leave request submitted"
        );
        Ok(stored)
    }

    pub fn get_request(&self, id: &LeaveRequestId) -> Result<LeaveRequest, LeaveServiceError> {
        self.store
            .fetch_request(id)?
            .ok_or_else(|| LeaveServiceError::request_not_found(id.0.clone()))
    }

    /// Newest first.
    pub fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        Ok(self.store.list_requests(filter)?)
    }

    pub fn watch_requests(&self, filter: RequestFilter) -> RequestFeed<S> {
        RequestFeed {
            store: Arc::clone(&self.store),
            filter,
            updates: self.store.subscribe(),
        }
    }
}

/// Live, filtered view over leave requests.
///
/// Reads are not transactional: a snapshot may trail an in-flight approval, and converges
/// once it commits.
pub struct RequestFeed<S> {
    store: Arc<S>,
    filter: RequestFilter,
    updates: watch::Receiver<u64>,
}

impl<S> RequestFeed<S>
where
    S: LeaveStore,
{
    pub fn filter(&self) -> &RequestFilter {
        &self.filter
    }

    pub fn current(&mut self) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        self.updates.borrow_and_update();
        Ok(self.store.list_requests(&self.filter)?)
    }

    /// Wait for the next committed write, then return the refreshed listing.
    pub async fn changed(&mut self) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        self.updates
            .changed()
            .await
            .map_err(|_| StoreError::Unavailable("document store dropped".to_string()))?;
        self.current()
    }
}
