use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::admins_repository::{AdminCredential, AdminId, AdminsRepository, AdminsRepositoryError};

pub struct InMemoryAdminsRepository {
    admin_sequence_generator: AtomicI32,
    admins: parking_lot::RwLock<HashMap<String, AdminCredential>>,
}

impl Default for InMemoryAdminsRepository {
    fn default() -> Self {
        Self {
            admin_sequence_generator: AtomicI32::new(1),
            admins: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl AdminsRepository for InMemoryAdminsRepository {
    async fn add_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminId, AdminsRepositoryError> {
        match self.admins.write().entry(username.to_string()) {
            Entry::Occupied(_) => Err(AdminsRepositoryError::AlreadyExists(username.to_string())),
            Entry::Vacant(entry) => {
                let id = self.admin_sequence_generator.fetch_add(1, Ordering::Relaxed);
                entry.insert(AdminCredential {
                    id,
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                });
                Ok(id)
            }
        }
    }

    async fn find_admin(
        &self,
        username: &str,
    ) -> Result<Option<AdminCredential>, AdminsRepositoryError> {
        Ok(self.admins.read().get(username).cloned())
    }
}
