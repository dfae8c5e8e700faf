//! Persistence contract for the leave workflow.
//!
//! Business logic depends only on these traits. Approvals and rejections run inside
//! [`Transactor::run_in_transaction`], which must provide isolated, conflict-detecting
//! transactions and may execute the body more than once; everything else is a plain read
//! or single-document write.

pub mod memory;

pub use memory::InMemoryLeaveStore;

use tokio::sync::watch;

use super::domain::{
    BalanceKey, CategoryId, EmployeeId, LeaveBalance, LeaveCategory, LeaveRequest,
    LeaveRequestId, RequestFilter,
};

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document already exists: {0}")]
    Conflict(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("transaction aborted after {attempts} conflicting attempts")]
    TransactionConflict { attempts: u32 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Document access available inside a transaction body.
///
/// Writes are buffered until commit; reads observe the transaction's own writes.
pub trait LeaveTransaction {
    fn request(&mut self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError>;
    fn put_request(&mut self, request: LeaveRequest);
    fn balance(&mut self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError>;
    fn put_balance(&mut self, balance: LeaveBalance);
}

/// Atomic read-modify-write primitive.
///
/// The body returns `Err` to abort: nothing it wrote becomes visible. Conflicting attempts
/// are retried by the store; once its budget is spent the caller receives
/// [`StoreError::TransactionConflict`] converted into `E`.
pub trait Transactor: Send + Sync {
    fn run_in_transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnMut(&mut dyn LeaveTransaction) -> Result<T, E>,
        E: From<StoreError>;
}

/// Full storage abstraction so the services can be exercised against any backend.
pub trait LeaveStore: Transactor {
    fn insert_request(&self, request: LeaveRequest) -> Result<LeaveRequest, StoreError>;
    fn fetch_request(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError>;
    fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError>;

    fn fetch_balance(&self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError>;
    fn list_balances(
        &self,
        employee_id: Option<&EmployeeId>,
    ) -> Result<Vec<LeaveBalance>, StoreError>;

    fn insert_category(&self, category: LeaveCategory) -> Result<LeaveCategory, StoreError>;
    fn update_category(&self, category: LeaveCategory) -> Result<LeaveCategory, StoreError>;
    fn fetch_category(&self, id: &CategoryId) -> Result<Option<LeaveCategory>, StoreError>;
    fn list_categories(&self) -> Result<Vec<LeaveCategory>, StoreError>;
    fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError>;

    /// Revision counter bumped after every committed write; drives live queries.
    fn subscribe(&self) -> watch::Receiver<u64>;
}
