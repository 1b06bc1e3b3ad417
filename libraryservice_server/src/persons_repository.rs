pub use in_memory_persons_repository::InMemoryPersonsRepository;
pub use postgres_persons_repository::PostgresPersonsRepository;

use crate::api::{Person, PersonDetails, PersonId};

mod in_memory_persons_repository;
mod postgres_persons_repository;

#[derive(thiserror::Error, Debug)]
pub enum PersonsRepositoryError {
    #[error("Person {0} not found")]
    NotFound(PersonId),

    #[error("Failed to deserialize person: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait PersonsRepository: Send + Sync {
    /// Adds person to repository, returns the stored person with its assigned id
    async fn add_person(&self, details: PersonDetails) -> Result<Person, PersonsRepositoryError>;
    async fn get_person(&self, person_id: PersonId) -> Result<Person, PersonsRepositoryError>;
    /// Lists all persons ordered by id
    async fn list_persons(&self) -> Result<Vec<Person>, PersonsRepositoryError>;
    /// Replaces name and email of the person, returns the updated person
    async fn update_person(
        &self,
        person_id: PersonId,
        details: PersonDetails,
    ) -> Result<Person, PersonsRepositoryError>;
    /// Deletes the person, returns false if there was nothing to delete
    async fn delete_person(&self, person_id: PersonId) -> Result<bool, PersonsRepositoryError>;
}
