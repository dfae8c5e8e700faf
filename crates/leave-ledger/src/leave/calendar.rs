use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Weekday};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Anything that can be reduced to a calendar day. Time-of-day is discarded.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Parses `YYYY-MM-DD`, an RFC 3339 timestamp, or a naive `YYYY-MM-DD[T ]HH:MM:SS`
/// timestamp. Timestamps keep the date they carry in their own offset.
pub fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|instant| instant.calendar_day())
        })
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .into_iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|instant| instant.calendar_day())
        })
}

/// Set of non-working days, compared by calendar date only.
///
/// Serializes as a plain array of dates; deserialization also accepts timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    days: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<D: CalendarDay>(&mut self, day: D) -> bool {
        self.days.insert(day.calendar_day())
    }

    pub fn contains<D: CalendarDay>(&self, day: &D) -> bool {
        self.days.contains(&day.calendar_day())
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }
}

impl<'de> Deserialize<'de> for HolidayCalendar {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| {
                parse_calendar_day(raw)
                    .ok_or_else(|| De::Error::custom(format!("invalid holiday '{raw}'")))
            })
            .collect()
    }
}

impl<D: CalendarDay> FromIterator<D> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().map(|day| day.calendar_day()).collect(),
        }
    }
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Working days in `[start, end]`: weekdays that are not holidays. Zero when `end < start`.
///
/// Scans day by day; leave spans are short and a holiday falling on a weekend must not
/// be subtracted twice.
pub fn business_days<S, E>(start: S, end: E, holidays: &HolidayCalendar) -> u32
where
    S: CalendarDay,
    E: CalendarDay,
{
    let start = start.calendar_day();
    let end = end.calendar_day();
    if end < start {
        return 0;
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !is_weekend(*day) && !holidays.contains(day))
        .fold(0, |count, _| count + 1)
}
