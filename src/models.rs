use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub timezone: Tz,
    pub clock: Clock,
}

impl AppState {
    /// Current instant in the practice's timezone.
    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.timezone)
    }
}

/// Source of "now" for period filters and `is_today` flags.
#[derive(Clone, Copy, Debug, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Used wherever a category (or its color) is absent.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6b7280";

/* -------------------------
   Backend rows
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Patient id.
    #[serde(default)]
    pub patient: Option<String>,
    /// Category id.
    #[serde(default)]
    pub category: Option<String>,
    /// Joined patient, only present on listing reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patients: Option<Patient>,
    /// Joined category, only present on listing reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Category>,
}

impl Appointment {
    /// Category color with the neutral fallback applied.
    pub fn color(&self) -> &str {
        self.categories
            .as_ref()
            .map(Category::color_or_default)
            .unwrap_or(DEFAULT_CATEGORY_COLOR)
    }

    pub fn patient_name(&self) -> Option<String> {
        self.patients.as_ref().and_then(Patient::display_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub care_level: Option<i32>,
    #[serde(default)]
    pub pronoun: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl Patient {
    /// "Firstname Lastname", or None when both are blank.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Category {
    pub fn color_or_default(&self) -> &str {
        self.color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CATEGORY_COLOR)
    }
}

/// The full writable field set of an appointment. Create and update both
/// send every field; there is no partial patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentFields {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub patient: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment() -> Appointment {
        Appointment {
            id: "a1".into(),
            created_at: None,
            updated_at: None,
            start_time: None,
            end_time: None,
            title: None,
            location: None,
            notes: None,
            patient: None,
            category: None,
            patients: None,
            categories: None,
        }
    }

    fn category(color: Option<&str>) -> Category {
        Category {
            id: "c1".into(),
            label: Some("Hausbesuch".into()),
            description: None,
            color: color.map(str::to_string),
            icon: None,
        }
    }

    #[test]
    fn null_color_falls_back_to_neutral() {
        let mut a = appointment();
        assert_eq!(a.color(), DEFAULT_CATEGORY_COLOR);

        a.categories = Some(category(None));
        assert_eq!(a.color(), DEFAULT_CATEGORY_COLOR);

        a.categories = Some(category(Some("#ff0000")));
        assert_eq!(a.color(), "#ff0000");
    }

    #[test]
    fn decodes_embedded_rows_with_partial_columns() {
        let json = r##"{
            "id": "a1",
            "created_at": "2024-03-01T10:00:00+00:00",
            "updated_at": null,
            "start_time": "2024-03-04T08:00:00+00:00",
            "end_time": null,
            "title": "Checkup",
            "location": null,
            "notes": null,
            "patient": "p1",
            "category": null,
            "patients": {
                "id": "p1", "firstname": "Erika", "lastname": "Mustermann", "pronoun": "sie"
            },
            "categories": null
        }"##;
        let a: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(a.patient.as_deref(), Some("p1"));
        assert_eq!(a.patient_name().as_deref(), Some("Erika Mustermann"));
        assert!(a.categories.is_none());
        assert_eq!(a.patients.unwrap().birth_date, None);
    }

    #[test]
    fn display_name_skips_blank_parts() {
        let p = Patient {
            id: "p1".into(),
            firstname: Some("  ".into()),
            lastname: Some("Meier".into()),
            birth_date: None,
            care_level: Some(2),
            pronoun: None,
            email: None,
            active: Some(true),
        };
        assert_eq!(p.display_name().as_deref(), Some("Meier"));
    }
}
