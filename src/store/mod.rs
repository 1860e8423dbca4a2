//! Data access for the three backend tables.
//!
//! Every operation returns a typed result. The read-degradation policy
//! (failed list => empty list) lives in [`crate::schedule::Snapshot::load`],
//! not here, so callers that need to tell "empty" from "broken" still can.

use async_trait::async_trait;

use crate::models::{Appointment, AppointmentFields, Category, Patient};

pub mod memory;
pub mod pg;
pub mod rest;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use rest::RestStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record {0} not found")]
    NotFound(String),
    #[error("backend returned no representation for {0}")]
    EmptyRepresentation(&'static str),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// All appointments ascending by start, joined with patient and category.
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError>;

    /// All patients ascending by last name.
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError>;

    /// All categories ascending by label.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn get_appointment(&self, id: &str) -> Result<Appointment, StoreError>;

    /// Inserts a record; the backend assigns the id.
    async fn create_appointment(&self, fields: &AppointmentFields)
    -> Result<Appointment, StoreError>;

    /// Overwrites every writable field of `id`.
    async fn update_appointment(
        &self,
        id: &str,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError>;

    async fn delete_appointment(&self, id: &str) -> Result<(), StoreError>;
}
