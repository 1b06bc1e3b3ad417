use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde_json::json;

use crate::api::{Person, PersonDetails, PersonId};
use crate::persons_repository::{PersonsRepository, PersonsRepositoryError};

pub struct InMemoryPersonsRepository {
    person_sequence_generator: AtomicI32,
    persons: parking_lot::RwLock<HashMap<PersonId, PersonDetails>>,
}

impl Default for InMemoryPersonsRepository {
    fn default() -> Self {
        Self {
            person_sequence_generator: AtomicI32::new(1),
            persons: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl PersonsRepository for InMemoryPersonsRepository {
    async fn add_person(&self, details: PersonDetails) -> Result<Person, PersonsRepositoryError> {
        let id = self
            .person_sequence_generator
            .fetch_add(1, Ordering::Relaxed);
        self.persons.write().insert(id, details.clone());
        Ok(Person::new(id, details))
    }

    async fn get_person(&self, person_id: PersonId) -> Result<Person, PersonsRepositoryError> {
        self.persons
            .read()
            .get(&person_id)
            .cloned()
            .map(|details| Person::new(person_id, details))
            .ok_or(PersonsRepositoryError::NotFound(person_id))
    }

    async fn list_persons(&self) -> Result<Vec<Person>, PersonsRepositoryError> {
        let mut persons: Vec<Person> = self
            .persons
            .read()
            .iter()
            .map(|(&person_id, details)| Person::new(person_id, details.clone()))
            .collect();
        persons.sort_by_key(|person| person.id);
        Ok(persons)
    }

    async fn update_person(
        &self,
        person_id: PersonId,
        details: PersonDetails,
    ) -> Result<Person, PersonsRepositoryError> {
        let mut locked_persons = self.persons.write();
        let person = locked_persons
            .get_mut(&person_id)
            .ok_or(PersonsRepositoryError::NotFound(person_id))?;
        let mut result_person = json!(person);
        json_patch::merge(&mut result_person, &json!(details));
        *person = serde_json::from_value(result_person)?;
        Ok(Person::new(person_id, person.clone()))
    }

    async fn delete_person(&self, person_id: PersonId) -> Result<bool, PersonsRepositoryError> {
        Ok(self.persons.write().remove(&person_id).is_some())
    }
}
