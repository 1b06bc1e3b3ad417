use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{BookId, PersonId, ReservationEntry, ReservationId, ReservationRecord};
use crate::reservations_repository::{
    ReservationsRepository, ReservationsRepositoryError, ReturnedCheckout,
};

pub struct InMemoryReservationsRepository {
    reservation_sequence_generator: AtomicI32,
    // ordered by id so that the first matching record is the oldest one
    records: parking_lot::RwLock<BTreeMap<ReservationId, ReservationRecord>>,
}

impl Default for InMemoryReservationsRepository {
    fn default() -> Self {
        Self {
            reservation_sequence_generator: AtomicI32::new(1),
            records: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl ReservationsRepository for InMemoryReservationsRepository {
    async fn add_reservation(
        &self,
        user_id: PersonId,
        entry: ReservationEntry,
    ) -> Result<ReservationId, ReservationsRepositoryError> {
        let id = self
            .reservation_sequence_generator
            .fetch_add(1, Ordering::Relaxed);
        self.records.write().insert(
            id,
            ReservationRecord {
                id,
                user_id,
                reservations: vec![entry],
            },
        );
        Ok(id)
    }

    async fn remove_reservation(
        &self,
        user_id: PersonId,
        book_id: BookId,
    ) -> Result<ReturnedCheckout, ReservationsRepositoryError> {
        let mut records_lock = self.records.write();

        let record = records_lock
            .values_mut()
            .find(|record| {
                record.user_id == user_id
                    && record
                        .reservations
                        .iter()
                        .any(|entry| entry.book_id == book_id)
            })
            .ok_or(ReservationsRepositoryError::ReservationNotFound { user_id, book_id })?;

        let (entries, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut record.reservations)
            .into_iter()
            .partition(|entry| entry.book_id == book_id);
        record.reservations = kept;
        Ok(ReturnedCheckout {
            reservation_id: record.id,
            entries,
        })
    }

    async fn list_reservations(
        &self,
    ) -> Result<Vec<ReservationRecord>, ReservationsRepositoryError> {
        Ok(self.records.read().values().cloned().collect())
    }
}
