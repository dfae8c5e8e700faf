use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for employees, as issued by the employee directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

/// Identifier wrapper for leave categories (e.g. `annuel`, `maladie`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl EmployeeId {
    /// Whether the id can be embedded in a ledger document id without ambiguity.
    pub fn is_key_safe(&self) -> bool {
        !self.0.contains(KEY_SEPARATOR)
    }
}

impl CategoryId {
    pub fn is_key_safe(&self) -> bool {
        !self.0.contains(KEY_SEPARATOR)
    }
}

/// Identifier wrapper for submitted leave requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveRequestId(pub String);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LeaveRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A kind of leave. `annual_days` is informational: the allocation rules apply their own ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveCategory {
    pub id: CategoryId,
    pub name: String,
    pub annual_days: Option<u32>,
    pub paid: bool,
}

/// Lifecycle of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    /// Set administratively once the leave has been consumed; no workflow transition produces it.
    Taken,
}

impl LeaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Taken => "taken",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "taken" => Some(Self::Taken),
            _ => None,
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: EmployeeId,
    pub category_id: CategoryId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<EmployeeId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    /// Business days covered. Provisional until approval restamps it.
    pub requested_days: u32,
}

impl LeaveRequest {
    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }

    /// Ledger row this request draws from: the year is taken from the start date.
    pub fn balance_key(&self) -> BalanceKey {
        BalanceKey::new(
            self.employee_id.clone(),
            self.category_id.clone(),
            self.start_date.year(),
        )
    }

    pub(crate) fn mark_approved(
        &mut self,
        approver: EmployeeId,
        approved_at: DateTime<Utc>,
        requested_days: u32,
    ) {
        self.status = LeaveStatus::Approved;
        self.approved_by = Some(approver);
        self.approved_at = Some(approved_at);
        self.requested_days = requested_days;
    }

    pub(crate) fn mark_rejected(
        &mut self,
        approver: EmployeeId,
        rejected_at: DateTime<Utc>,
        comment: Option<String>,
    ) {
        self.status = LeaveStatus::Rejected;
        self.approved_by = Some(approver);
        self.approved_at = Some(rejected_at);
        self.comment = comment;
    }
}

/// Structured identity of a ledger row. Stores key on this value; the flat
/// `employee_category_year` string is derived from it and never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub employee_id: EmployeeId,
    pub category_id: CategoryId,
    pub year: i32,
}

impl BalanceKey {
    pub fn new(employee_id: EmployeeId, category_id: CategoryId, year: i32) -> Self {
        Self {
            employee_id,
            category_id,
            year,
        }
    }

    pub fn document_id(&self) -> String {
        balance_document_id(&self.employee_id, &self.category_id, self.year)
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document_id())
    }
}

/// Joins the parts of a ledger document id. Employee and category ids may not contain it.
pub const KEY_SEPARATOR: char = '_';

/// Composite document id shared by every read and write of a ledger row.
pub fn balance_document_id(employee_id: &EmployeeId, category_id: &CategoryId, year: i32) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        employee_id.0,
        category_id.0,
        year,
        sep = KEY_SEPARATOR
    )
}

/// Per (employee, category, year) ledger of entitlement against consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub id: String,
    pub employee_id: EmployeeId,
    pub category_id: CategoryId,
    pub year: i32,
    pub allocated: u32,
    pub used: u32,
    pub carried_over: u32,
}

impl LeaveBalance {
    /// Fresh ledger row with nothing consumed and nothing carried over.
    pub fn open(key: &BalanceKey, allocated: u32) -> Self {
        Self {
            id: key.document_id(),
            employee_id: key.employee_id.clone(),
            category_id: key.category_id.clone(),
            year: key.year,
            allocated,
            used: 0,
            carried_over: 0,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey::new(self.employee_id.clone(), self.category_id.clone(), self.year)
    }

    /// `allocated + carried_over - used`; signed so an inconsistent row is observable rather than wrapped.
    pub fn available(&self) -> i64 {
        i64::from(self.allocated) + i64::from(self.carried_over) - i64::from(self.used)
    }

    pub fn view(&self) -> BalanceView {
        BalanceView {
            id: self.id.clone(),
            employee_id: self.employee_id.clone(),
            category_id: self.category_id.clone(),
            year: self.year,
            allocated: self.allocated,
            used: self.used,
            carried_over: self.carried_over,
            available: self.available(),
        }
    }
}

/// Serialized balance including the derived `available` figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub id: String,
    pub employee_id: EmployeeId,
    pub category_id: CategoryId,
    pub year: i32,
    pub allocated: u32,
    pub used: u32,
    pub carried_over: u32,
    pub available: i64,
}

/// Employee directory entry used for entitlement computations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeEntry {
    pub employee_id: EmployeeId,
    pub entry_date: NaiveDate,
}

/// Optional filters for request listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    pub employee_id: Option<EmployeeId>,
    pub status: Option<LeaveStatus>,
}

impl RequestFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id
            .as_ref()
            .map_or(true, |employee| &request.employee_id == employee)
            && self.status.map_or(true, |status| request.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_joins_employee_category_and_year() {
        let key = BalanceKey::new(
            EmployeeId("E1".to_string()),
            CategoryId("annuel".to_string()),
            2024,
        );
        assert_eq!(key.document_id(), "E1_annuel_2024");
        assert_eq!(LeaveBalance::open(&key, 12).id, "E1_annuel_2024");
    }

    #[test]
    fn separator_marks_ids_as_unsafe_for_keys() {
        assert!(EmployeeId("E1".to_string()).is_key_safe());
        assert!(!EmployeeId("A_b".to_string()).is_key_safe());
        assert!(CategoryId("annuel".to_string()).is_key_safe());
        assert!(!CategoryId("b_c".to_string()).is_key_safe());
    }

    #[test]
    fn available_can_be_observed_below_zero() {
        let key = BalanceKey::new(
            EmployeeId("E1".to_string()),
            CategoryId("annuel".to_string()),
            2024,
        );
        let mut balance = LeaveBalance::open(&key, 3);
        balance.used = 5;
        assert_eq!(balance.available(), -2);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(LeaveStatus::parse(" Approved "), Some(LeaveStatus::Approved));
        assert_eq!(LeaveStatus::parse("cancelled"), None);
    }
}
