//! CSV loaders for the collaborator data the workflow consumes: holiday calendars and the
//! employee directory.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::calendar::HolidayCalendar;
use super::domain::{EmployeeEntry, EmployeeId};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { line: u64, value: String },
    #[error("line {line}: employee id is empty")]
    MissingEmployeeId { line: u64 },
}

/// Reads `date[,name]` rows. Blank dates are skipped.
pub fn holidays_from_reader<R: Read>(reader: R) -> Result<HolidayCalendar, ImportError> {
    let mut csv_reader = csv_reader(reader);
    let mut calendar = HolidayCalendar::new();

    for (index, record) in csv_reader.deserialize::<HolidayRow>().enumerate() {
        let row = record?;
        let Some(raw) = row.date else {
            continue;
        };
        calendar.insert(parse_date(&raw, line_number(index))?);
    }

    Ok(calendar)
}

pub fn holidays_from_path<P: AsRef<Path>>(path: P) -> Result<HolidayCalendar, ImportError> {
    let file = std::fs::File::open(path)?;
    holidays_from_reader(file)
}

/// Reads `employee_id,entry_date` rows.
pub fn employees_from_reader<R: Read>(reader: R) -> Result<Vec<EmployeeEntry>, ImportError> {
    let mut csv_reader = csv_reader(reader);
    let mut employees = Vec::new();

    for (index, record) in csv_reader.deserialize::<EmployeeRow>().enumerate() {
        let row = record?;
        let line = line_number(index);
        if row.employee_id.is_empty() {
            return Err(ImportError::MissingEmployeeId { line });
        }
        employees.push(EmployeeEntry {
            employee_id: EmployeeId(row.employee_id),
            entry_date: parse_date(&row.entry_date, line)?,
        });
    }

    Ok(employees)
}

pub fn employees_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<EmployeeEntry>, ImportError> {
    let file = std::fs::File::open(path)?;
    employees_from_reader(file)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

// Header occupies line 1.
fn line_number(index: usize) -> u64 {
    index as u64 + 2
}

fn parse_date(raw: &str, line: u64) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ImportError::InvalidDate {
        line,
        value: raw.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct HolidayRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmployeeRow {
    employee_id: String,
    entry_date: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holiday_rows_with_names_and_blanks() {
        let csv = "date,name\n2024-01-01,Nouvel An\n,\n2024-05-01,Fête du Travail\n";
        let calendar = holidays_from_reader(csv.as_bytes()).expect("parses");
        assert_eq!(calendar.len(), 2);
        assert!(calendar.contains(&NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid")));
    }

    #[test]
    fn holiday_date_must_be_iso() {
        let csv = "date\n01/05/2024\n";
        match holidays_from_reader(csv.as_bytes()) {
            Err(ImportError::InvalidDate { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "01/05/2024");
            }
            other => panic!("expected invalid date, got {other:?}"),
        }
    }

    #[test]
    fn employee_directory_rows() {
        let csv = "employee_id,entry_date\nE1, 2020-06-01\nE2,2019-01-01\n";
        let employees = employees_from_reader(csv.as_bytes()).expect("parses");
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].employee_id, EmployeeId("E1".to_string()));
        assert_eq!(
            employees[1].entry_date,
            NaiveDate::from_ymd_opt(2019, 1, 1).expect("valid")
        );
    }

    #[test]
    fn employee_id_is_required() {
        let csv = "employee_id,entry_date\n,2020-06-01\n";
        assert!(matches!(
            employees_from_reader(csv.as_bytes()),
            Err(ImportError::MissingEmployeeId { line: 2 })
        ));
    }
}
