//! Calendar bucketing for the list, week and month views.
//!
//! All three views work on local calendar dates in the practice timezone and
//! drop appointments that have no start.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::Appointment;

pub const FIRST_SLOT_HOUR: u32 = 8;
pub const LAST_SLOT_HOUR: u32 = 19;
/// Cards shown per month cell before collapsing into an overflow count.
pub const MONTH_CELL_LIMIT: usize = 2;
pub const UNTITLED: &str = "Untitled appointment";

pub fn local_date(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// What every view renders for one appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentCard {
    pub id: String,
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// "09:00 - 09:30", or just the start when there is no end.
    pub time_range: Option<String>,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub category_id: Option<String>,
    pub category_label: Option<String>,
    pub color: String,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentCard {
    pub fn new(a: &Appointment, tz: &Tz) -> Self {
        let hhmm = |t: DateTime<Utc>| t.with_timezone(tz).format("%H:%M").to_string();
        let time_range = a.start_time.map(|start| match a.end_time {
            Some(end) => format!("{} - {}", hhmm(start), hhmm(end)),
            None => hhmm(start),
        });

        Self {
            id: a.id.clone(),
            title: a
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            start_time: a.start_time,
            end_time: a.end_time,
            time_range,
            patient_id: a.patient.clone(),
            patient_name: a.patient_name(),
            category_id: a.category.clone(),
            category_label: a.categories.as_ref().and_then(|c| c.label.clone()),
            color: a.color().to_string(),
            location: a.location.clone(),
            notes: a.notes.clone(),
        }
    }
}

/// Buckets by local start date. Input order is kept inside each day.
fn by_day<'a>(
    appointments: &'a [Appointment],
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<&'a Appointment>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Appointment>> = BTreeMap::new();
    for a in appointments {
        if let Some(start) = a.start_time {
            days.entry(local_date(start, tz)).or_default().push(a);
        }
    }
    days
}

/* -------------------------
   List view
--------------------------*/

#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub is_today: bool,
    pub appointments: Vec<AppointmentCard>,
}

pub fn group_by_day(appointments: &[Appointment], today: NaiveDate, tz: &Tz) -> Vec<DayGroup> {
    by_day(appointments, tz)
        .into_iter()
        .map(|(date, list)| DayGroup {
            date,
            is_today: date == today,
            appointments: list.into_iter().map(|a| AppointmentCard::new(a, tz)).collect(),
        })
        .collect()
}

/* -------------------------
   Week view
--------------------------*/

#[derive(Debug, Clone, Serialize)]
pub struct HourSlot {
    pub hour: u32,
    pub appointments: Vec<AppointmentCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub slots: Vec<HourSlot>,
    /// Appointments starting before the first or after the last slot hour.
    pub outside_hours: Vec<AppointmentCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekGrid {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub previous: NaiveDate,
    pub next: NaiveDate,
    pub days: Vec<WeekDay>,
}

pub fn week_grid(
    appointments: &[Appointment],
    anchor: NaiveDate,
    today: NaiveDate,
    tz: &Tz,
) -> WeekGrid {
    let start = week_start(anchor);
    let mut buckets = by_day(appointments, tz);

    let days = (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let mut slots: Vec<HourSlot> = (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
                .map(|hour| HourSlot {
                    hour,
                    appointments: Vec::new(),
                })
                .collect();
            let mut outside_hours = Vec::new();

            for a in buckets.remove(&date).unwrap_or_default() {
                let Some(at) = a.start_time else { continue };
                let hour = at.with_timezone(tz).hour();
                let card = AppointmentCard::new(a, tz);
                if (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR).contains(&hour) {
                    slots[(hour - FIRST_SLOT_HOUR) as usize].appointments.push(card);
                } else {
                    outside_hours.push(card);
                }
            }

            WeekDay {
                date,
                is_today: date == today,
                slots,
                outside_hours,
            }
        })
        .collect();

    WeekGrid {
        week_start: start,
        week_end: start + Duration::days(6),
        previous: start - Duration::days(7),
        next: start + Duration::days(7),
        days,
    }
}

/* -------------------------
   Month view
--------------------------*/

#[derive(Debug, Clone, Serialize)]
pub struct MonthCell {
    pub date: NaiveDate,
    /// False for leading/trailing days of adjacent months.
    pub in_month: bool,
    pub is_today: bool,
    pub appointments: Vec<AppointmentCard>,
    /// How many appointments did not fit into the cell.
    pub overflow: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub previous: NaiveDate,
    pub next: NaiveDate,
    pub cells: Vec<MonthCell>,
}

pub fn month_grid(
    appointments: &[Appointment],
    anchor: NaiveDate,
    today: NaiveDate,
    tz: &Tz,
) -> MonthGrid {
    let first = month_start(anchor);
    let last = month_end(anchor);
    let grid_start = week_start(first);
    let grid_end = week_start(last) + Duration::days(6);
    let mut buckets = by_day(appointments, tz);

    let mut cells = Vec::new();
    let mut date = grid_start;
    while date <= grid_end {
        let list = buckets.remove(&date).unwrap_or_default();
        let overflow = list.len().saturating_sub(MONTH_CELL_LIMIT);
        cells.push(MonthCell {
            date,
            in_month: date.month() == first.month() && date.year() == first.year(),
            is_today: date == today,
            appointments: list
                .into_iter()
                .take(MONTH_CELL_LIMIT)
                .map(|a| AppointmentCard::new(a, tz))
                .collect(),
            overflow,
        });
        date += Duration::days(1);
    }

    MonthGrid {
        month_start: first,
        month_end: last,
        previous: first - Months::new(1),
        next: first + Months::new(1),
        cells,
    }
}
