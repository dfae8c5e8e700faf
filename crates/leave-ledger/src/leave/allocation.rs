//! Annual entitlement derived from employment seniority.
//!
//! One day accrues per month worked in the target year (a partial month counts as a
//! full one), plus one bonus day per completed five years of service, capped at 18.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const MAX_ACCRUED_DAYS: u32 = 12;
pub const SENIORITY_STEP_YEARS: u32 = 5;
pub const MAX_ANNUAL_DAYS: u32 = 18;

/// Intermediate figures behind an allocation, for previews and audit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocationBreakdown {
    pub year: i32,
    pub months_worked: u32,
    pub base_days: u32,
    pub seniority_years: u32,
    pub bonus_days: u32,
    pub total: u32,
}

/// Entitled days for `year` given the employment start date. Always within `0..=18`.
pub fn calculate_annual_allocation(entry_date: NaiveDate, year: i32) -> u32 {
    allocation_breakdown(entry_date, year).total
}

pub fn allocation_breakdown(entry_date: NaiveDate, year: i32) -> AllocationBreakdown {
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return AllocationBreakdown::empty(year);
    };

    if entry_date > year_end {
        return AllocationBreakdown::empty(year);
    }

    let counted_from = entry_date.max(year_start);
    let months_worked = inclusive_month_count(counted_from, year_end).min(12);
    let base_days = months_worked.min(MAX_ACCRUED_DAYS);
    let seniority_years = full_years_between(entry_date, year_end);
    let bonus_days = seniority_years / SENIORITY_STEP_YEARS;

    AllocationBreakdown {
        year,
        months_worked,
        base_days,
        seniority_years,
        bonus_days,
        total: (base_days + bonus_days).min(MAX_ANNUAL_DAYS),
    }
}

impl AllocationBreakdown {
    const fn empty(year: i32) -> Self {
        Self {
            year,
            months_worked: 0,
            base_days: 0,
            seniority_years: 0,
            bonus_days: 0,
            total: 0,
        }
    }
}

/// Calendar months touched by `[from, to]`, counting partial months.
fn inclusive_month_count(from: NaiveDate, to: NaiveDate) -> u32 {
    if to < from {
        return 0;
    }
    let months = (to.year() - from.year()) * 12 + to.month0() as i32 - from.month0() as i32 + 1;
    u32::try_from(months).unwrap_or(0)
}

/// Completed anniversaries between the two dates (floor, not calendar-year subtraction).
fn full_years_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}
