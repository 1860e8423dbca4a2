use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::calendar::{local_date, month_end, month_start, week_start};
use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Same local calendar day as now.
    Today,
    /// Monday..=Sunday week containing now.
    Week,
    /// Calendar month containing now.
    Month,
}

/// Selected filter criteria. Absent fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "empty_period_as_none")]
    pub period: Option<Period>,
}

// Query strings carry `?period=` for "no selection".
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let inner = Option::<String>::deserialize(deserializer)?;
    Ok(inner.filter(|s| !s.trim().is_empty()))
}

fn empty_period_as_none<'de, D>(deserializer: D) -> Result<Option<Period>, D::Error>
where
    D: Deserializer<'de>,
{
    match empty_string_as_none(deserializer)? {
        None => Ok(None),
        Some(s) => match s.trim() {
            "today" => Ok(Some(Period::Today)),
            "week" => Ok(Some(Period::Week)),
            "month" => Ok(Some(Period::Month)),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["today", "week", "month"],
            )),
        },
    }
}

impl Period {
    /// Inclusive local-date range covered by this period around `today`.
    pub fn date_range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Today => (today, today),
            Period::Week => {
                let start = week_start(today);
                (start, start + chrono::Duration::days(6))
            }
            Period::Month => (month_start(today), month_end(today)),
        }
    }
}

/// Derives the visible subset. Order of `appointments` is preserved.
pub fn filter(
    appointments: &[Appointment],
    criteria: &FilterCriteria,
    now: DateTime<Tz>,
) -> Vec<Appointment> {
    let tz = now.timezone();
    let range = criteria
        .period
        .map(|p| p.date_range(now.date_naive()));

    appointments
        .iter()
        .filter(|a| match &criteria.patient_id {
            Some(id) => a.patient.as_deref() == Some(id.as_str()),
            None => true,
        })
        .filter(|a| match &criteria.category_id {
            Some(id) => a.category.as_deref() == Some(id.as_str()),
            None => true,
        })
        .filter(|a| match range {
            Some((from, to)) => a
                .start_time
                .map(|start| {
                    let day = local_date(start, &tz);
                    from <= day && day <= to
                })
                .unwrap_or(false),
            None => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Berlin;

    fn at(tz: &Tz, y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn appt(
        id: &str,
        start: Option<DateTime<Utc>>,
        patient: Option<&str>,
        category: Option<&str>,
    ) -> Appointment {
        Appointment {
            id: id.into(),
            created_at: None,
            updated_at: None,
            start_time: start,
            end_time: None,
            title: Some(id.into()),
            location: None,
            notes: None,
            patient: patient.map(str::to_string),
            category: category.map(str::to_string),
            patients: None,
            categories: None,
        }
    }

    fn ids(v: &[Appointment]) -> Vec<&str> {
        v.iter().map(|a| a.id.as_str()).collect()
    }

    // Wednesday 2024-03-06 14:00 Berlin
    fn now() -> DateTime<Tz> {
        Berlin.with_ymd_and_hms(2024, 3, 6, 14, 0, 0).unwrap()
    }

    fn sample() -> Vec<Appointment> {
        vec![
            appt("a", Some(at(&Berlin, 2024, 3, 6, 9, 0, 0)), Some("p1"), Some("c1")),
            appt("b", Some(at(&Berlin, 2024, 3, 4, 0, 0, 0)), Some("p2"), Some("c1")),
            appt("c", Some(at(&Berlin, 2024, 3, 29, 10, 0, 0)), Some("p1"), Some("c2")),
            appt("d", None, Some("p1"), None),
            appt("e", Some(at(&Berlin, 2024, 2, 28, 10, 0, 0)), None, Some("c2")),
        ]
    }

    #[test]
    fn no_criteria_is_identity() {
        let all = sample();
        assert_eq!(filter(&all, &FilterCriteria::default(), now()), all);
    }

    #[test]
    fn result_is_always_a_subset_in_input_order() {
        let all = sample();
        for period in [None, Some(Period::Today), Some(Period::Week), Some(Period::Month)] {
            for patient in [None, Some("p1"), Some("nobody")] {
                let criteria = FilterCriteria {
                    patient_id: patient.map(str::to_string),
                    category_id: None,
                    period,
                };
                let out = filter(&all, &criteria, now());
                let mut cursor = all.iter();
                for a in &out {
                    assert!(cursor.any(|b| b == a), "{} not in order", a.id);
                }
            }
        }
    }

    #[test]
    fn patient_and_category_compose_with_and() {
        let all = sample();
        let criteria = FilterCriteria {
            patient_id: Some("p1".into()),
            category_id: Some("c1".into()),
            period: None,
        };
        assert_eq!(ids(&filter(&all, &criteria, now())), vec!["a"]);
    }

    #[test]
    fn missing_start_only_matters_for_periods() {
        let all = sample();
        let by_patient = FilterCriteria {
            patient_id: Some("p1".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &by_patient, now())), vec!["a", "c", "d"]);

        let by_month = FilterCriteria {
            period: Some(Period::Month),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &by_month, now())), vec!["a", "b", "c"]);
    }

    #[test]
    fn today_uses_local_calendar_day() {
        let all = vec![
            appt("midnight", Some(at(&Berlin, 2024, 3, 6, 0, 0, 0)), None, None),
            appt("late", Some(at(&Berlin, 2024, 3, 6, 23, 59, 59)), None, None),
            appt("yesterday", Some(at(&Berlin, 2024, 3, 5, 23, 59, 59)), None, None),
        ];
        let criteria = FilterCriteria {
            period: Some(Period::Today),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &criteria, now())), vec!["midnight", "late"]);
    }

    #[test]
    fn week_starts_monday_and_includes_sunday_evening() {
        let all = vec![
            appt("monday", Some(at(&Berlin, 2024, 3, 4, 0, 0, 0)), None, None),
            appt("prev-sunday", Some(at(&Berlin, 2024, 3, 3, 23, 59, 0)), None, None),
            appt("sunday", Some(at(&Berlin, 2024, 3, 10, 21, 0, 0)), None, None),
            appt("next-monday", Some(at(&Berlin, 2024, 3, 11, 0, 0, 0)), None, None),
        ];
        let criteria = FilterCriteria {
            period: Some(Period::Week),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &criteria, now())), vec!["monday", "sunday"]);
    }

    #[test]
    fn month_range_handles_year_end_and_leap_february() {
        let dec = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(
            Period::Month.date_range(dec),
            (
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
            )
        );
        let feb = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(Period::Month.date_range(feb).1, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn utc_instant_is_judged_in_local_time() {
        // 23:30 UTC on the 5th is already the 6th in Berlin
        let late = Utc.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap();
        let all = vec![appt("x", Some(late), None, None)];
        let criteria = FilterCriteria {
            period: Some(Period::Today),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &criteria, now())), vec!["x"]);
    }

    #[test]
    fn empty_query_values_mean_no_filter() {
        let c: FilterCriteria =
            serde_json::from_str(r#"{"patient_id":"","category_id":"c1","period":""}"#).unwrap();
        assert_eq!(
            c,
            FilterCriteria {
                patient_id: None,
                category_id: Some("c1".into()),
                period: None
            }
        );
        assert!(serde_json::from_str::<FilterCriteria>(r#"{"period":"year"}"#).is_err());
    }
}
