//! Hosted store client speaking the PostgREST dialect.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use super::{Store, StoreError};
use crate::models::{Appointment, AppointmentFields, Category, Patient};

const APPOINTMENT_SELECT: &str = "*,\
patients!appointments_patient_fkey(id,firstname,lastname,pronoun),\
categories!appointments_category_fkey(id,label,color,icon)";

#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

/// Body for insert and update: all writable fields plus a fresh `updated_at`.
#[derive(Serialize)]
struct WriteRow<'a> {
    #[serde(flatten)]
    fields: &'a AppointmentFields,
    updated_at: DateTime<Utc>,
}

impl RestStore {
    pub fn new(url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        table: &'static str,
    ) -> Result<Vec<T>, StoreError> {
        let response = self.authed(req).send().await?;
        let response = check_status(response, table).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(format!("{table}: {e}")))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        table: &'static str,
        select: &str,
        order: &str,
    ) -> Result<Vec<T>, StoreError> {
        debug!(table, order, "listing");
        let req = self
            .client
            .get(self.table_url(table))
            .query(&[("select", select), ("order", order)]);
        self.fetch_rows(req, table).await
    }
}

async fn check_status(response: Response, table: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(table, %status, %body, "backend request failed");
    Err(StoreError::Backend {
        status: status.as_u16(),
        body,
    })
}

fn first_row(
    rows: Vec<Appointment>,
    id: Option<&str>,
) -> Result<Appointment, StoreError> {
    match (rows.into_iter().next(), id) {
        (Some(row), _) => Ok(row),
        (None, Some(id)) => Err(StoreError::NotFound(id.to_string())),
        (None, None) => Err(StoreError::EmptyRepresentation("appointments")),
    }
}

#[async_trait]
impl Store for RestStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        self.list("appointments", APPOINTMENT_SELECT, "start_time.asc")
            .await
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        self.list("patients", "*", "lastname.asc").await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.list("categories", "*", "label.asc").await
    }

    async fn get_appointment(&self, id: &str) -> Result<Appointment, StoreError> {
        let filter = format!("eq.{id}");
        let req = self
            .client
            .get(self.table_url("appointments"))
            .query(&[("select", APPOINTMENT_SELECT), ("id", filter.as_str())]);
        let rows = self.fetch_rows(req, "appointments").await?;
        first_row(rows, Some(id))
    }

    async fn create_appointment(
        &self,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        let body = [WriteRow {
            fields,
            updated_at: Utc::now(),
        }];
        let req = self
            .client
            .post(self.table_url("appointments"))
            .query(&[("select", APPOINTMENT_SELECT)])
            .header("Prefer", "return=representation")
            .json(&body);
        let rows = self.fetch_rows(req, "appointments").await?;
        first_row(rows, None)
    }

    async fn update_appointment(
        &self,
        id: &str,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        let filter = format!("eq.{id}");
        let body = WriteRow {
            fields,
            updated_at: Utc::now(),
        };
        let req = self
            .client
            .patch(self.table_url("appointments"))
            .query(&[("select", APPOINTMENT_SELECT), ("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&body);
        let rows = self.fetch_rows(req, "appointments").await?;
        first_row(rows, Some(id))
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        let req = self
            .client
            .delete(self.table_url("appointments"))
            .query(&[("select", "id"), ("id", filter.as_str())])
            .header("Prefer", "return=representation");
        let rows: Vec<serde_json::Value> = self.fetch_rows(req, "appointments").await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
