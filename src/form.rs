//! The create/edit dialog's form state and its conversion to store fields.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{Appointment, AppointmentFields};

/// `datetime-local` input shape.
const LOCAL_MINUTES: &str = "%Y-%m-%dT%H:%M";
const LOCAL_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormError {
    #[error("title is required")]
    TitleRequired,
    #[error("start_time is required")]
    StartRequired,
    #[error("{field} must be YYYY-MM-DDTHH:MM or RFC 3339, got `{value}`")]
    InvalidDateTime { field: &'static str, value: String },
    #[error("{field} `{value}` does not exist in the practice timezone")]
    NonexistentLocalTime { field: &'static str, value: String },
    #[error("end_time must not be before start_time")]
    EndBeforeStart,
}

/// Raw dialog input. Every field is a string, blank means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentForm {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub patient: String,
    pub category: String,
    pub notes: String,
}

fn blank_to_none(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

fn parse_instant(
    field: &'static str,
    raw: &str,
    tz: &Tz,
) -> Result<Option<DateTime<Utc>>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let naive = NaiveDateTime::parse_from_str(raw, LOCAL_MINUTES)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, LOCAL_SECONDS));
    match naive {
        Ok(naive) => match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => Ok(Some(t.with_timezone(&Utc))),
            // autumn fold: take the first occurrence
            LocalResult::Ambiguous(first, _) => Ok(Some(first.with_timezone(&Utc))),
            LocalResult::None => Err(FormError::NonexistentLocalTime {
                field,
                value: raw.to_string(),
            }),
        },
        Err(_) => DateTime::parse_from_rfc3339(raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| FormError::InvalidDateTime {
                field,
                value: raw.to_string(),
            }),
    }
}

fn format_local(t: Option<DateTime<Utc>>, tz: &Tz) -> String {
    t.map(|t| t.with_timezone(tz).format(LOCAL_MINUTES).to_string())
        .unwrap_or_default()
}

impl AppointmentForm {
    /// Pre-fills the edit dialog.
    pub fn from_appointment(a: &Appointment, tz: &Tz) -> Self {
        Self {
            title: a.title.clone().unwrap_or_default(),
            start_time: format_local(a.start_time, tz),
            end_time: format_local(a.end_time, tz),
            location: a.location.clone().unwrap_or_default(),
            patient: a.patient.clone().unwrap_or_default(),
            category: a.category.clone().unwrap_or_default(),
            notes: a.notes.clone().unwrap_or_default(),
        }
    }

    pub fn to_fields(&self, tz: &Tz) -> Result<AppointmentFields, FormError> {
        let title = blank_to_none(&self.title).ok_or(FormError::TitleRequired)?;
        let start_time =
            parse_instant("start_time", &self.start_time, tz)?.ok_or(FormError::StartRequired)?;
        let end_time = parse_instant("end_time", &self.end_time, tz)?;

        if end_time.is_some_and(|end| end < start_time) {
            return Err(FormError::EndBeforeStart);
        }

        Ok(AppointmentFields {
            title: Some(title),
            start_time: Some(start_time),
            end_time,
            location: blank_to_none(&self.location),
            patient: blank_to_none(&self.patient),
            category: blank_to_none(&self.category),
            notes: blank_to_none(&self.notes),
        })
    }
}
