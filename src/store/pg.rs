//! Direct Postgres access to the same three tables the hosted store exposes.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use super::{Store, StoreError};
use crate::models::{Appointment, AppointmentFields, Category, Patient};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

const APPOINTMENT_SELECT: &str = r#"
    SELECT
      a.id::text       AS id,
      a.created_at,
      a.updated_at,
      a.start_time,
      a.end_time,
      a.title,
      a.location,
      a.notes,
      a.patient::text  AS patient,
      a.category::text AS category,

      p.id::text  AS p_id,
      p.firstname AS p_firstname,
      p.lastname  AS p_lastname,
      p.pronoun   AS p_pronoun,

      c.id::text AS c_id,
      c.label    AS c_label,
      c.color    AS c_color,
      c.icon     AS c_icon

    FROM appointments a
    LEFT JOIN patients p   ON p.id = a.patient
    LEFT JOIN categories c ON c.id = a.category
"#;

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { db })
    }
}

fn row_to_appointment(r: &PgRow) -> Result<Appointment, sqlx::Error> {
    let p_id: Option<String> = r.try_get("p_id")?;
    let patients = match p_id {
        Some(id) => Some(Patient {
            id,
            firstname: r.try_get("p_firstname")?,
            lastname: r.try_get("p_lastname")?,
            birth_date: None,
            care_level: None,
            pronoun: r.try_get("p_pronoun")?,
            email: None,
            active: None,
        }),
        None => None,
    };

    let c_id: Option<String> = r.try_get("c_id")?;
    let categories = match c_id {
        Some(id) => Some(Category {
            id,
            label: r.try_get("c_label")?,
            description: None,
            color: r.try_get("c_color")?,
            icon: r.try_get("c_icon")?,
        }),
        None => None,
    };

    Ok(Appointment {
        id: r.try_get("id")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
        start_time: r.try_get("start_time")?,
        end_time: r.try_get("end_time")?,
        title: r.try_get("title")?,
        location: r.try_get("location")?,
        notes: r.try_get("notes")?,
        patient: r.try_get("patient")?,
        category: r.try_get("category")?,
        patients,
        categories,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        let sql = format!("{APPOINTMENT_SELECT} ORDER BY a.start_time ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;
        rows.iter()
            .map(|r| row_to_appointment(r).map_err(StoreError::Db))
            .collect()
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        let rows = sqlx::query_as::<_, Patient>(
            r#"
            SELECT
              id::text AS id,
              firstname,
              lastname,
              birth_date,
              care_level::int4 AS care_level,
              pronoun,
              email,
              active
            FROM patients
            ORDER BY lastname ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id::text AS id, label, description, color, icon
            FROM categories
            ORDER BY label ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get_appointment(&self, id: &str) -> Result<Appointment, StoreError> {
        let sql = format!("{APPOINTMENT_SELECT} WHERE a.id::text = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(row_to_appointment(&row)?)
    }

    async fn create_appointment(
        &self,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO appointments (
              title,
              start_time,
              end_time,
              location,
              patient,
              category,
              notes,
              updated_at
            )
            VALUES ($1, $2, $3, $4, $5::uuid, $6::uuid, $7, now())
            RETURNING id::text AS id
            "#,
        )
        .bind(fields.title.as_deref())
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(fields.location.as_deref())
        .bind(fields.patient.as_deref())
        .bind(fields.category.as_deref())
        .bind(fields.notes.as_deref())
        .fetch_one(&self.db)
        .await?;

        let id: String = row.try_get("id")?;
        self.get_appointment(&id).await
    }

    async fn update_appointment(
        &self,
        id: &str,
        fields: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET
              title      = $2,
              start_time = $3,
              end_time   = $4,
              location   = $5,
              patient    = $6::uuid,
              category   = $7::uuid,
              notes      = $8,
              updated_at = now()
            WHERE id::text = $1
            "#,
        )
        .bind(id)
        .bind(fields.title.as_deref())
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(fields.location.as_deref())
        .bind(fields.patient.as_deref())
        .bind(fields.category.as_deref())
        .bind(fields.notes.as_deref())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.get_appointment(id).await
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(r#"DELETE FROM appointments WHERE id::text = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
