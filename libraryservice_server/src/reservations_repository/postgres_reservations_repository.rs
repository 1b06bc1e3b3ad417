use serde_json::json;
use tokio_postgres::{Client, Statement};

use crate::api::{BookId, PersonId, ReservationEntry, ReservationId, ReservationRecord};
use crate::postgres::{connect, PostgresConfig};
use crate::reservations_repository::{
    ReservationsRepository, ReservationsRepositoryError, ReturnedCheckout,
};

const RESERVATIONS_SCHEMA: &str = "
        CREATE TABLE IF NOT EXISTS reservations (
            id                   SERIAL PRIMARY KEY,
            user_id              INTEGER NOT NULL,
            entries              JSONB NOT NULL DEFAULT '[]'::JSONB
            )
        ";

pub struct PostgresReservationsRepository {
    client: Client,
}

impl PostgresReservationsRepository {
    pub async fn init(config: PostgresConfig) -> anyhow::Result<Self> {
        let client = connect(&config, RESERVATIONS_SCHEMA).await?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ReservationsRepository for PostgresReservationsRepository {
    async fn add_reservation(
        &self,
        user_id: PersonId,
        entry: ReservationEntry,
    ) -> Result<ReservationId, ReservationsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO reservations (user_id, entries) VALUES ($1, $2) RETURNING id")
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&user_id, &json!([entry])])
            .await?;

        let reservation_id: ReservationId = rows
            .first()
            .ok_or_else(|| ReservationsRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(reservation_id)
    }

    async fn remove_reservation(
        &self,
        user_id: PersonId,
        book_id: BookId,
    ) -> Result<ReturnedCheckout, ReservationsRepositoryError> {
        // Records locked by a concurrent return are skipped, so parallel returns of the same
        // book spread over the person's records instead of competing for the oldest one
        let stmt: Statement = self
            .client
            .prepare(
                "WITH target AS (
                     SELECT id, entries FROM reservations
                     WHERE user_id = $1
                       AND entries @> jsonb_build_array(jsonb_build_object('bookId', $2::INTEGER))
                     ORDER BY id
                     LIMIT 1
                     FOR UPDATE SKIP LOCKED)
                 UPDATE reservations
                 SET entries = COALESCE(
                     (SELECT jsonb_agg(entry ORDER BY position)
                      FROM jsonb_array_elements(target.entries) WITH ORDINALITY AS e(entry, position)
                      WHERE (entry->>'bookId')::INTEGER <> $2),
                     '[]'::JSONB)
                 FROM target
                 WHERE reservations.id = target.id
                 RETURNING reservations.id,
                     (SELECT jsonb_agg(entry ORDER BY position)
                      FROM jsonb_array_elements(target.entries) WITH ORDINALITY AS e(entry, position)
                      WHERE (entry->>'bookId')::INTEGER = $2)",
            )
            .await?;

        // A record changed by a return that committed while this one was planned fails the
        // recheck and yields no row even if the person holds another copy, so look once more
        for _ in 0..2 {
            let rows = self.client.query(&stmt, &[&user_id, &book_id]).await?;
            if let Some(row) = rows.first() {
                let entries: serde_json::Value = row.try_get(1)?;
                return Ok(ReturnedCheckout {
                    reservation_id: row.try_get(0)?,
                    entries: serde_json::from_value(entries)?,
                });
            }
        }
        Err(ReservationsRepositoryError::ReservationNotFound { user_id, book_id })
    }

    async fn list_reservations(
        &self,
    ) -> Result<Vec<ReservationRecord>, ReservationsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, user_id, entries FROM reservations ORDER BY id")
            .await?;

        let rows = self.client.query(&stmt, &[]).await?;

        rows.iter()
            .map(|row| {
                let entries: serde_json::Value = row.try_get(2)?;
                Ok(ReservationRecord {
                    id: row.try_get(0)?,
                    user_id: row.try_get(1)?,
                    reservations: serde_json::from_value(entries)?,
                })
            })
            .collect()
    }
}
