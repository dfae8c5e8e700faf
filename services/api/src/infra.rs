use chrono::NaiveDate;
use leave_ledger::error::AppError;
use leave_ledger::leave::import::holidays_from_path;
use leave_ledger::leave::HolidayCalendar;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Loads the holiday calendar, or an empty one when no file is configured.
pub(crate) fn load_holidays(path: Option<&Path>) -> Result<HolidayCalendar, AppError> {
    let Some(path) = path else {
        return Ok(HolidayCalendar::new());
    };
    let calendar = holidays_from_path(path)?;
    info!(path = %path.display(), holidays = calendar.len(), "holiday calendar loaded");
    Ok(calendar)
}
