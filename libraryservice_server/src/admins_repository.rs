pub use in_memory_admins_repository::InMemoryAdminsRepository;
pub use postgres_admins_repository::PostgresAdminsRepository;

mod in_memory_admins_repository;
mod postgres_admins_repository;

pub type AdminId = i32;

/// Stored admin credential, the password is kept only as an argon2 PHC string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub id: AdminId,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AdminsRepositoryError {
    #[error("Admin {0} already exists")]
    AlreadyExists(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait AdminsRepository: Send + Sync {
    /// Adds admin with already hashed password, usernames are unique
    async fn add_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminId, AdminsRepositoryError>;

    async fn find_admin(
        &self,
        username: &str,
    ) -> Result<Option<AdminCredential>, AdminsRepositoryError>;
}
