//! Leave entitlement, business-day accounting, and the approval workflow.
//!
//! Balances are only ever debited inside a store transaction that also flips the request to
//! `approved`; creation and listing are plain document operations.

pub mod allocation;
pub mod balance;
pub mod calendar;
pub mod categories;
pub mod clock;
pub mod domain;
pub mod error;
pub mod import;
pub mod ledger;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use allocation::{allocation_breakdown, calculate_annual_allocation, AllocationBreakdown};
pub use calendar::{business_days, parse_calendar_day, CalendarDay, HolidayCalendar};
pub use categories::{CategoryDraft, CategoryRegistry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    balance_document_id, BalanceKey, BalanceView, CategoryId, EmployeeEntry, EmployeeId,
    LeaveBalance, LeaveCategory, LeaveRequest, LeaveRequestId, LeaveStatus, RequestFilter,
};
pub use error::LeaveServiceError;
pub use import::ImportError;
pub use ledger::{RequestFeed, RequestLedger};
pub use router::leave_router;
pub use service::{ApprovalOutcome, LeaveService, SeedFailure, SeedReport};
pub use store::{InMemoryLeaveStore, LeaveStore, LeaveTransaction, StoreError, Transactor};
