//! Loads the page's data and drives the filter/dialog workflow on top of it.
//!
//! `Page` is the one path from loaded rows to rendered views. The view
//! endpoints build a fresh `Page` per request; an interactive client keeps
//! one alive for its anchors and dialog state.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::calendar::{self, DayGroup, MonthGrid, WeekGrid};
use crate::filter::{self, FilterCriteria};
use crate::form::AppointmentForm;
use crate::models::{Appointment, Category, Patient};
use crate::store::{Store, StoreError};

/// One consistent read of all three tables.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub appointments: Vec<Appointment>,
    pub patients: Vec<Patient>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub appointments: usize,
    pub patients: usize,
    pub categories: usize,
}

/// Read policy: a failed list is logged and shown as empty.
pub fn or_empty<T>(table: &str, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        error!(table, error = %e, "list failed, showing empty result");
        Vec::new()
    })
}

impl Snapshot {
    /// Issues the three list reads concurrently. A failed read yields an
    /// empty list, never an error.
    pub async fn load(store: &dyn Store) -> Self {
        let (appointments, patients, categories) = tokio::join!(
            store.list_appointments(),
            store.list_patients(),
            store.list_categories(),
        );
        Self {
            appointments: or_empty("appointments", appointments),
            patients: or_empty("patients", patients),
            categories: or_empty("categories", categories),
        }
    }

    pub fn appointment(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn overview(&self) -> Overview {
        Overview {
            appointments: self.appointments.len(),
            patients: self.patients.len(),
            categories: self.categories.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Closed,
    Creating,
    Editing(String),
}

/// Interactive state of the scheduling page for one user session.
pub struct Page<'s> {
    store: &'s dyn Store,
    tz: Tz,
    pub snapshot: Snapshot,
    pub criteria: FilterCriteria,
    pub week_anchor: NaiveDate,
    pub month_anchor: NaiveDate,
    pub dialog: Dialog,
    pub form: AppointmentForm,
    /// Message of the last failed write, shown inside the open dialog.
    pub last_error: Option<String>,
}

impl<'s> Page<'s> {
    pub async fn open(store: &'s dyn Store, now: DateTime<Tz>) -> Page<'s> {
        let today = now.date_naive();
        Page {
            store,
            tz: now.timezone(),
            snapshot: Snapshot::load(store).await,
            criteria: FilterCriteria::default(),
            week_anchor: today,
            month_anchor: today,
            dialog: Dialog::Closed,
            form: AppointmentForm::default(),
            last_error: None,
        }
    }

    pub async fn reload(&mut self) {
        self.snapshot = Snapshot::load(self.store).await;
    }

    /// Recomputed on every call from the full set.
    pub fn visible(&self, now: DateTime<Tz>) -> Vec<Appointment> {
        filter::filter(&self.snapshot.appointments, &self.criteria, now)
    }

    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    pub fn list_view(&self, now: DateTime<Tz>) -> Vec<DayGroup> {
        calendar::group_by_day(&self.visible(now), now.date_naive(), &self.tz)
    }

    pub fn week_view(&self, now: DateTime<Tz>) -> WeekGrid {
        calendar::week_grid(&self.visible(now), self.week_anchor, now.date_naive(), &self.tz)
    }

    pub fn month_view(&self, now: DateTime<Tz>) -> MonthGrid {
        calendar::month_grid(&self.visible(now), self.month_anchor, now.date_naive(), &self.tz)
    }

    pub fn open_create(&mut self) {
        self.dialog = Dialog::Creating;
        self.form = AppointmentForm::default();
        self.last_error = None;
    }

    /// Returns false when `id` is not in the current snapshot.
    pub fn open_edit(&mut self, id: &str) -> bool {
        let Some(a) = self.snapshot.appointment(id) else {
            warn!(id, "edit requested for unknown appointment");
            return false;
        };
        self.form = AppointmentForm::from_appointment(a, &self.tz);
        self.dialog = Dialog::Editing(id.to_string());
        self.last_error = None;
        true
    }

    pub fn close_dialog(&mut self) {
        self.dialog = Dialog::Closed;
        self.last_error = None;
    }

    /// Saves the form. On success everything is reloaded and the dialog
    /// closes; on failure the dialog stays open with `last_error` set.
    pub async fn submit(&mut self) -> bool {
        let fields = match self.form.to_fields(&self.tz) {
            Ok(fields) => fields,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return false;
            }
        };

        let result = match &self.dialog {
            Dialog::Closed => return false,
            Dialog::Creating => self.store.create_appointment(&fields).await,
            Dialog::Editing(id) => self.store.update_appointment(id, &fields).await,
        };

        match result {
            Ok(saved) => {
                info!(id = %saved.id, "appointment saved");
                self.after_write().await;
                true
            }
            Err(e) => {
                error!(error = %e, "saving appointment failed");
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Deletes the appointment being edited.
    pub async fn delete(&mut self) -> bool {
        let Dialog::Editing(id) = &self.dialog else {
            return false;
        };
        let id = id.clone();
        match self.store.delete_appointment(&id).await {
            Ok(()) => {
                info!(%id, "appointment deleted");
                self.after_write().await;
                true
            }
            Err(e) => {
                error!(%id, error = %e, "deleting appointment failed");
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    async fn after_write(&mut self) {
        self.reload().await;
        self.close_dialog();
    }
}
