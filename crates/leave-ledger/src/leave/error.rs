use chrono::NaiveDate;

use super::domain::{BalanceKey, CategoryId, EmployeeId, LeaveStatus};
use super::store::StoreError;

/// Error raised by the leave services. Every variant other than `Store` is a business-rule
/// rejection that aborts its transaction before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaveServiceError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("leave request {id} is {status}, only pending requests can be decided")]
    InvalidState { id: String, status: LeaveStatus },
    #[error("insufficient balance on {balance_id}: {available} day(s) available, {requested} requested")]
    InsufficientBalance {
        balance_id: String,
        available: i64,
        requested: u32,
    },
    #[error("balance {balance_id} would drop to {available} day(s) available")]
    Overdrawn { balance_id: String, available: i64 },
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("{kind} id '{id}' must not contain '_'")]
    InvalidIdentifier { kind: &'static str, id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LeaveServiceError {
    pub(crate) fn request_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "leave request",
            id: id.into(),
        }
    }

    pub(crate) fn balance_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "leave balance",
            id: id.into(),
        }
    }

    pub(crate) fn category_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "leave category",
            id: id.into(),
        }
    }

    pub(crate) fn ensure_employee_key(id: &EmployeeId) -> Result<(), Self> {
        if id.is_key_safe() {
            Ok(())
        } else {
            Err(Self::InvalidIdentifier {
                kind: "employee",
                id: id.0.clone(),
            })
        }
    }

    pub(crate) fn ensure_category_key(id: &CategoryId) -> Result<(), Self> {
        if id.is_key_safe() {
            Ok(())
        } else {
            Err(Self::InvalidIdentifier {
                kind: "leave category",
                id: id.0.clone(),
            })
        }
    }

    /// Rejects keys whose document id could be shared with another (employee, category) pair.
    pub(crate) fn ensure_balance_key(key: &BalanceKey) -> Result<(), Self> {
        Self::ensure_employee_key(&key.employee_id)?;
        Self::ensure_category_key(&key.category_id)
    }
}
