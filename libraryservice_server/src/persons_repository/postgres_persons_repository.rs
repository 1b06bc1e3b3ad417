use serde_json::json;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{Person, PersonDetails, PersonId};
use crate::persons_repository::{PersonsRepository, PersonsRepositoryError};
use crate::postgres::{connect, PostgresConfig};

const PERSONS_SCHEMA: &str = "
        CREATE TABLE IF NOT EXISTS persons (
            id              SERIAL PRIMARY KEY,
            params          JSONB NOT NULL
            )
        ";

pub struct PostgresPersonsRepository {
    client: Client,
}

impl PostgresPersonsRepository {
    pub async fn init(config: PostgresConfig) -> anyhow::Result<Self> {
        let client = connect(&config, PERSONS_SCHEMA).await?;
        Ok(Self { client })
    }
}

fn person_from_row(row: &Row) -> Result<Person, PersonsRepositoryError> {
    let person_id: PersonId = row.try_get(0)?;
    let details: serde_json::Value = row.try_get(1)?;
    Ok(Person::new(person_id, serde_json::from_value(details)?))
}

#[async_trait::async_trait]
impl PersonsRepository for PostgresPersonsRepository {
    async fn add_person(&self, details: PersonDetails) -> Result<Person, PersonsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO persons (params) VALUES ($1) RETURNING id")
            .await?;

        let rows = self.client.query(&stmt, &[&json!(details)]).await?;

        let person_id: PersonId = rows
            .first()
            .ok_or_else(|| PersonsRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(Person::new(person_id, details))
    }

    async fn get_person(&self, person_id: PersonId) -> Result<Person, PersonsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, params FROM persons WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&person_id]).await?;

        person_from_row(
            rows.first()
                .ok_or(PersonsRepositoryError::NotFound(person_id))?,
        )
    }

    async fn list_persons(&self) -> Result<Vec<Person>, PersonsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, params FROM persons ORDER BY id")
            .await?;
        let rows = self.client.query(&stmt, &[]).await?;
        rows.iter().map(person_from_row).collect()
    }

    async fn update_person(
        &self,
        person_id: PersonId,
        details: PersonDetails,
    ) -> Result<Person, PersonsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE persons SET params = params || ($1)::JSONB WHERE id = ($2) RETURNING id, params",
            )
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&json!(details), &person_id])
            .await?;

        person_from_row(
            rows.first()
                .ok_or(PersonsRepositoryError::NotFound(person_id))?,
        )
    }

    async fn delete_person(&self, person_id: PersonId) -> Result<bool, PersonsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM persons WHERE id = ($1) RETURNING id")
            .await?;
        Ok(!self.client.query(&stmt, &[&person_id]).await?.is_empty())
    }
}
