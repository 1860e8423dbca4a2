use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{Appointment, AppointmentFields, Category, Patient};

#[derive(Default)]
struct Tables {
    // kept in insertion order, like a heap table
    appointments: Vec<Appointment>,
    patients: Vec<Patient>,
    categories: Vec<Category>,
}

/// Process-local store with the same ordering and join behaviour as the
/// hosted backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(patients: Vec<Patient>, categories: Vec<Category>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                appointments: Vec::new(),
                patients,
                categories,
            }),
        }
    }

    /// Inserts a record verbatim, keeping its id and timestamps.
    pub async fn insert_raw(&self, appointment: Appointment) {
        self.tables.write().await.appointments.push(appointment);
    }
}

impl Tables {
    fn joined(&self, a: &Appointment) -> Appointment {
        let mut out = a.clone();
        out.patients = a
            .patient
            .as_deref()
            .and_then(|id| self.patients.iter().find(|p| p.id == id))
            .cloned();
        out.categories = a
            .category
            .as_deref()
            .and_then(|id| self.categories.iter().find(|c| c.id == id))
            .cloned();
        out
    }

    fn find(&self, id: &str) -> Result<Appointment, StoreError> {
        self.appointments
            .iter()
            .find(|a| a.id == id)
            .map(|a| self.joined(a))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn apply(a: &mut Appointment, fields: &AppointmentFields) {
    a.title = fields.title.clone();
    a.start_time = fields.start_time;
    a.end_time = fields.end_time;
    a.location = fields.location.clone();
    a.patient = fields.patient.clone();
    a.category = fields.category.clone();
    a.notes = fields.notes.clone();
    a.updated_at = Some(Utc::now());
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Appointment> =
            tables.appointments.iter().map(|a| tables.joined(a)).collect();
        // stable; records without a start go last, as with ORDER BY ... ASC
        rows.sort_by_key(|a| (a.start_time.is_none(), a.start_time));
        Ok(rows)
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        let mut rows = self.tables.read().await.patients.clone();
        rows.sort_by(|a, b| {
            (a.lastname.is_none(), &a.lastname).cmp(&(b.lastname.is_none(), &b.lastname))
        });
        Ok(rows)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut rows = self.tables.read().await.categories.clone();
        rows.sort_by(|a, b| (a.label.is_none(), &a.label).cmp(&(b.label.is_none(), &b.label)));
        Ok(rows)
    }

    async fn get_appointment(&self, id: &str) -> Result<Appointment, StoreError> {
        self.tables.read().await.find(id)
    }

    async fn create_appointment(
        &self,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;
        let mut a = Appointment {
            id: Uuid::new_v4().to_string(),
            created_at: Some(Utc::now()),
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
        };
        apply(&mut a, fields);
        let id = a.id.clone();
        tables.appointments.push(a);
        tables.find(&id)
    }

    async fn update_appointment(
        &self,
        id: &str,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;
        let a = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply(a, fields);
        tables.find(id)
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.appointments.len();
        tables.appointments.retain(|a| a.id != id);
        if tables.appointments.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
