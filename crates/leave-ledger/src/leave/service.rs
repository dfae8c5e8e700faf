use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::allocation::calculate_annual_allocation;
use super::balance;
use super::calendar::{business_days, HolidayCalendar};
use super::categories::CategoryRegistry;
use super::clock::{Clock, SystemClock};
use super::domain::{
    BalanceKey, BalanceView, CategoryId, EmployeeEntry, EmployeeId, LeaveBalance, LeaveRequest,
    LeaveRequestId, RequestFilter,
};
use super::error::LeaveServiceError;
use super::ledger::{RequestFeed, RequestLedger};
use super::store::LeaveStore;

/// Request and balance as committed together by an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    pub request: LeaveRequest,
    pub balance: LeaveBalance,
}

/// Result of a bulk seeding run. Each employee is upserted independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub year: i32,
    pub category_id: Option<CategoryId>,
    pub seeded: Vec<BalanceView>,
    pub failures: Vec<SeedFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    pub employee_id: EmployeeId,
    pub error: String,
}

/// Facade composing the request ledger, category registry, and approval workflow.
pub struct LeaveService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ledger: RequestLedger<S>,
    categories: CategoryRegistry<S>,
}

impl<S> LeaveService<S>
where
    S: LeaveStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let ledger = RequestLedger::new(Arc::clone(&store), Arc::clone(&clock));
        let categories = CategoryRegistry::new(Arc::clone(&store));
        Self {
            store,
            clock,
            ledger,
            categories,
        }
    }

    pub fn categories(&self) -> &CategoryRegistry<S> {
        &self.categories
    }

    /// Submit a pending request stamped with its provisional business-day count.
    pub fn request_leave(
        &self,
        employee_id: EmployeeId,
        category_id: CategoryId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        holidays: &HolidayCalendar,
    ) -> Result<LeaveRequest, LeaveServiceError> {
        self.ledger
            .create_request(employee_id, category_id, start_date, end_date, holidays)
    }

    pub fn get_request(&self, id: &LeaveRequestId) -> Result<LeaveRequest, LeaveServiceError> {
        self.ledger.get_request(id)
    }

    pub fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        self.ledger.list_requests(filter)
    }

    pub fn watch_requests(&self, filter: RequestFilter) -> RequestFeed<S> {
        self.ledger.watch_requests(filter)
    }

    /// Approve a pending request and debit its balance in one transaction.
    ///
    /// The day count and the entitlement are recomputed from the arguments rather than
    /// trusted from creation time, and the balance's `allocated` is corrected to the fresh
    /// entitlement before the sufficiency check. Any failure leaves both documents untouched.
    pub fn approve(
        &self,
        request_id: &LeaveRequestId,
        approver: &EmployeeId,
        employee_entry_date: NaiveDate,
        holidays: &HolidayCalendar,
    ) -> Result<ApprovalOutcome, LeaveServiceError> {
        let approved_at = self.clock.now();

        let result = self.store.run_in_transaction(|tx| {
            let mut request = tx
                .request(request_id)?
                .ok_or_else(|| LeaveServiceError::request_not_found(request_id.0.clone()))?;
            ensure_pending(&request)?;

            let requested_days = business_days(request.start_date, request.end_date, holidays);
            let key = request.balance_key();
            let fresh_allocation = calculate_annual_allocation(employee_entry_date, key.year);

            balance::get_or_repair(tx, &key, fresh_allocation)?;
            let balance = balance::debit(tx, &key, requested_days)?;

            request.mark_approved(approver.clone(), approved_at, requested_days);
            tx.put_request(request.clone());
            Ok::<_, LeaveServiceError>(ApprovalOutcome { request, balance })
        });

        match &result {
            Ok(outcome) => info!(
                request_id = %request_id,
                balance_id = %outcome.balance.id,
                requested_days = outcome.request.requested_days,
                available = outcome.balance.available(),
                "leave request approved"
            ),
            Err(err) => warn!(request_id = %request_id, error = %err, "leave approval refused"),
        }
        result
    }

    /// Reject a pending request. Balances are never read or written.
    pub fn reject(
        &self,
        request_id: &LeaveRequestId,
        approver: &EmployeeId,
        comment: Option<String>,
    ) -> Result<LeaveRequest, LeaveServiceError> {
        let rejected_at = self.clock.now();

        let result = self.store.run_in_transaction(|tx| {
            let mut request = tx
                .request(request_id)?
                .ok_or_else(|| LeaveServiceError::request_not_found(request_id.0.clone()))?;
            ensure_pending(&request)?;

            request.mark_rejected(approver.clone(), rejected_at, comment.clone());
            tx.put_request(request.clone());
            Ok::<_, LeaveServiceError>(request)
        });

        match &result {
            Ok(_) => info!(request_id = %request_id, "leave request rejected"),
            Err(err) => warn!(request_id = %request_id, error = %err, "leave rejection refused"),
        }
        result
    }

    /// Upsert this year's entitlement for every employee in the directory.
    ///
    /// Not atomic across employees: each balance is its own idempotent transaction, so a
    /// failure for one employee does not undo the others and a rerun is harmless.
    pub fn seed_annual_allocations(
        &self,
        employees: &[EmployeeEntry],
        year: i32,
        category_id: &CategoryId,
    ) -> SeedReport {
        let mut report = SeedReport {
            year,
            category_id: Some(category_id.clone()),
            ..SeedReport::default()
        };

        for employee in employees {
            let key = BalanceKey::new(employee.employee_id.clone(), category_id.clone(), year);
            let allocated = calculate_annual_allocation(employee.entry_date, year);

            let seeded = LeaveServiceError::ensure_balance_key(&key).and_then(|()| {
                self.store
                    .run_in_transaction(|tx| balance::seed_or_credit(tx, &key, allocated, None))
            });
            match seeded {
                Ok(seeded) => report.seeded.push(seeded.view()),
                Err(err) => {
                    warn!(balance_id = %key, error = %err, "annual allocation seeding failed");
                    report.failures.push(SeedFailure {
                        employee_id: employee.employee_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            year,
            category_id = %category_id,
            seeded = report.seeded.len(),
            failed = report.failures.len(),
            "annual allocations seeded"
        );
        report
    }

    /// Record the days carried over from the previous year. Sets the figure, never adds.
    ///
    /// A missing balance is opened with zero allocation; seeding or the first approval
    /// settles the entitlement.
    pub fn credit_carry_over(
        &self,
        key: &BalanceKey,
        days: u32,
    ) -> Result<LeaveBalance, LeaveServiceError> {
        LeaveServiceError::ensure_balance_key(key)?;
        let credited = self.store.run_in_transaction(|tx| {
            let allocated = tx.balance(key)?.map_or(0, |existing| existing.allocated);
            balance::seed_or_credit(tx, key, allocated, Some(days))
        })?;
        info!(balance_id = %credited.id, carried_over = days, "carry-over credited");
        Ok(credited)
    }

    pub fn get_balance(&self, key: &BalanceKey) -> Result<LeaveBalance, LeaveServiceError> {
        self.store
            .fetch_balance(key)?
            .ok_or_else(|| LeaveServiceError::balance_not_found(key.document_id()))
    }

    pub fn list_balances(
        &self,
        employee_id: Option<&EmployeeId>,
    ) -> Result<Vec<LeaveBalance>, LeaveServiceError> {
        Ok(self.store.list_balances(employee_id)?)
    }
}

fn ensure_pending(request: &LeaveRequest) -> Result<(), LeaveServiceError> {
    if request.is_pending() {
        Ok(())
    } else {
        Err(LeaveServiceError::InvalidState {
            id: request.id.0.clone(),
            status: request.status,
        })
    }
}
