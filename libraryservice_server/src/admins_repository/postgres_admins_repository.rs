use tokio_postgres::{Client, Statement};

use crate::admins_repository::{AdminCredential, AdminId, AdminsRepository, AdminsRepositoryError};
use crate::postgres::{connect, is_unique_violation, PostgresConfig};

const ADMINS_SCHEMA: &str = "
        CREATE TABLE IF NOT EXISTS admins (
            id                   SERIAL PRIMARY KEY,
            username             TEXT NOT NULL UNIQUE,
            password_hash        TEXT NOT NULL
            )
        ";

pub struct PostgresAdminsRepository {
    client: Client,
}

impl PostgresAdminsRepository {
    pub async fn init(config: PostgresConfig) -> anyhow::Result<Self> {
        let client = connect(&config, ADMINS_SCHEMA).await?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl AdminsRepository for PostgresAdminsRepository {
    async fn add_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminId, AdminsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO admins (username, password_hash) VALUES ($1, $2) RETURNING id")
            .await?;

        match self.client.query(&stmt, &[&username, &password_hash]).await {
            Ok(rows) => Ok(rows
                .first()
                .ok_or_else(|| AdminsRepositoryError::Other("Id not returned".to_string()))?
                .try_get(0)?),
            Err(err) if is_unique_violation(&err) => {
                Err(AdminsRepositoryError::AlreadyExists(username.to_string()))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }

    async fn find_admin(
        &self,
        username: &str,
    ) -> Result<Option<AdminCredential>, AdminsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, username, password_hash FROM admins WHERE username = $1")
            .await?;

        let rows = self.client.query(&stmt, &[&username]).await?;

        rows.first()
            .map(|row| {
                Ok(AdminCredential {
                    id: row.try_get(0)?,
                    username: row.try_get(1)?,
                    password_hash: row.try_get(2)?,
                })
            })
            .transpose()
    }
}
