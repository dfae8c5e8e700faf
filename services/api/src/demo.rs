use crate::infra::load_holidays;
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use leave_ledger::error::AppError;
use leave_ledger::leave::import::employees_from_path;
use leave_ledger::leave::{
    allocation_breakdown, business_days, CategoryDraft, CategoryId, EmployeeEntry, EmployeeId,
    HolidayCalendar, InMemoryLeaveStore, LeaveRequest, LeaveService, LeaveStatus, RequestFilter,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

const DEMO_CATEGORY: &str = "annuel";

#[derive(Args, Debug)]
pub(crate) struct AllocationArgs {
    /// Employment start date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) entry_date: NaiveDate,
    /// Entitlement year (defaults to the current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
}

#[derive(Args, Debug)]
pub(crate) struct BusinessDaysArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: NaiveDate,
    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: NaiveDate,
    /// Holiday calendar CSV (`date[,name]` rows)
    #[arg(long)]
    pub(crate) holidays_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Entitlement year to seed (defaults to the current year)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1970..=2100))]
    pub(crate) year: Option<i32>,
    /// Employee directory CSV (`employee_id,entry_date` rows). Defaults to a sample team.
    #[arg(long)]
    pub(crate) employees_csv: Option<PathBuf>,
    /// Holiday calendar CSV (`date[,name]` rows)
    #[arg(long)]
    pub(crate) holidays_csv: Option<PathBuf>,
}

pub(crate) fn run_allocation(args: AllocationArgs) -> Result<(), AppError> {
    let year = args.year.unwrap_or_else(|| Local::now().year());
    let breakdown = allocation_breakdown(args.entry_date, year);

    println!("Annual entitlement for {year} (hired {})", args.entry_date);
    println!(
        "- {} month(s) worked -> {} base day(s)",
        breakdown.months_worked, breakdown.base_days
    );
    println!(
        "- {} completed year(s) of service -> {} bonus day(s)",
        breakdown.seniority_years, breakdown.bonus_days
    );
    println!("- Total: {} day(s)", breakdown.total);
    Ok(())
}

pub(crate) fn run_business_days(args: BusinessDaysArgs) -> Result<(), AppError> {
    let holidays = load_holidays(args.holidays_csv.as_deref())?;
    let days = business_days(args.start, args.end, &holidays);
    println!(
        "{} working day(s) from {} to {} ({} holiday(s) in calendar)",
        days,
        args.start,
        args.end,
        holidays.len()
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let year = args.year.unwrap_or_else(|| Local::now().year());
    let employees = match args.employees_csv.as_deref() {
        Some(path) => employees_from_path(path)?,
        None => sample_team(year),
    };
    let holidays = match args.holidays_csv.as_deref() {
        Some(path) => load_holidays(Some(path))?,
        None => sample_holidays(year),
    };
    let Some(first) = employees.first().cloned() else {
        println!("Employee directory is empty; nothing to demonstrate");
        return Ok(());
    };
    let (Some(july), Some(august)) = (
        NaiveDate::from_ymd_opt(year, 7, 1),
        NaiveDate::from_ymd_opt(year, 8, 1),
    ) else {
        println!("Year {year} is outside the supported calendar");
        return Ok(());
    };

    let store = Arc::new(InMemoryLeaveStore::new());
    let service = LeaveService::new(store);
    let category = CategoryId(DEMO_CATEGORY.to_string());
    service.categories().create(
        category.clone(),
        CategoryDraft {
            name: "Congé annuel".to_string(),
            annual_days: Some(18),
            paid: true,
        },
    )?;

    println!("Leave ledger demo for {year}");
    println!(
        "{} employee(s), {} holiday(s) in calendar",
        employees.len(),
        holidays.len()
    );

    let report = service.seed_annual_allocations(&employees, year, &category);
    println!("\nSeeded balances");
    for view in &report.seeded {
        println!(
            "- {}: {} allocated, {} available",
            view.employee_id, view.allocated, view.available
        );
    }
    for failure in &report.failures {
        println!("- {}: seeding failed ({})", failure.employee_id, failure.error);
    }

    println!("\nApproval flow for {}", first.employee_id);
    let week = submit(&service, &first.employee_id, &category, july, 4, &holidays)?;
    match service.approve(&week.id, &manager(), first.entry_date, &holidays) {
        Ok(outcome) => println!(
            "- Approved {} ({} day(s)) -> {} day(s) left",
            outcome.request.id,
            outcome.request.requested_days,
            outcome.balance.available()
        ),
        Err(err) => println!("- Approval refused: {err}"),
    }

    let month = submit(&service, &first.employee_id, &category, august, 30, &holidays)?;
    match service.approve(&month.id, &manager(), first.entry_date, &holidays) {
        Ok(outcome) => println!("- Unexpectedly approved {}", outcome.request.id),
        Err(err) => println!("- Approval refused: {err}"),
    }
    let month = service.reject(
        &month.id,
        &manager(),
        Some("Please split this into shorter periods".to_string()),
    )?;
    println!(
        "- {} is now {} ({})",
        month.id,
        month.status,
        month.comment.as_deref().unwrap_or("no comment")
    );

    if let Some(second) = employees.get(1) {
        run_parallel_approvals(&service, second, &category, &holidays, year)?;
    }

    let pending = service.list_requests(&RequestFilter {
        employee_id: None,
        status: Some(LeaveStatus::Pending),
    })?;
    println!("\nPending requests: {}", pending.len());
    println!("\nFinal balances");
    for balance in service.list_balances(None)? {
        let view = balance.view();
        println!(
            "- {}: allocated {} | used {} | carried over {} | available {}",
            view.id, view.allocated, view.used, view.carried_over, view.available
        );
    }

    Ok(())
}

/// Fires every request for `employee` at once; the store serializes the debits.
fn run_parallel_approvals(
    service: &LeaveService<InMemoryLeaveStore>,
    employee: &EmployeeEntry,
    category: &CategoryId,
    holidays: &HolidayCalendar,
    year: i32,
) -> Result<(), AppError> {
    println!("\nParallel approvals for {}", employee.employee_id);
    let mut requests = Vec::new();
    for month in [9, 10, 11] {
        let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
            continue;
        };
        requests.push(submit(
            service,
            &employee.employee_id,
            category,
            start,
            6,
            holidays,
        )?);
    }

    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| {
                scope.spawn(move || {
                    service.approve(&request.id, &manager(), employee.entry_date, holidays)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    for (request, outcome) in requests.iter().zip(outcomes) {
        match outcome {
            Ok(Ok(approved)) => println!(
                "- {} approved ({} day(s)), {} left",
                request.id,
                approved.request.requested_days,
                approved.balance.available()
            ),
            Ok(Err(err)) => println!("- {} refused: {err}", request.id),
            Err(_) => println!("- {} approval thread panicked", request.id),
        }
    }
    Ok(())
}

fn submit(
    service: &LeaveService<InMemoryLeaveStore>,
    employee_id: &EmployeeId,
    category: &CategoryId,
    start: NaiveDate,
    span_days: i64,
    holidays: &HolidayCalendar,
) -> Result<LeaveRequest, AppError> {
    let end = start + chrono::Duration::days(span_days);
    let request = service.request_leave(
        employee_id.clone(),
        category.clone(),
        start,
        end,
        holidays,
    )?;
    println!(
        "- Submitted {}: {} to {} ({} working day(s))",
        request.id, request.start_date, request.end_date, request.requested_days
    );
    Ok(request)
}

fn manager() -> EmployeeId {
    EmployeeId("MGR-1".to_string())
}

fn sample_team(year: i32) -> Vec<EmployeeEntry> {
    [("E1", year - 8, 3), ("E2", year - 2, 9), ("E3", year, 5)]
        .into_iter()
        .filter_map(|(id, hired_year, month)| {
            NaiveDate::from_ymd_opt(hired_year, month, 1).map(|entry_date| EmployeeEntry {
                employee_id: EmployeeId(id.to_string()),
                entry_date,
            })
        })
        .collect()
}

fn sample_holidays(year: i32) -> HolidayCalendar {
    [(1, 1), (5, 1), (5, 8), (7, 14), (8, 15), (11, 1), (11, 11), (12, 25)]
        .into_iter()
        .filter_map(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}
