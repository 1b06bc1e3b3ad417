use anyhow::Context;

use crate::api::{BookDetails, MakeReservationRequest, PersonDetails};
use crate::books_repository::BooksRepository;
use crate::persons_repository::PersonsRepository;
use crate::reservation_desk::ReservationDesk;

/// Inserts a small catalog, two persons and one reservation if there are no books yet.
/// Returns false when the store already had data
pub async fn seed_sample_data(
    books: &dyn BooksRepository,
    persons: &dyn PersonsRepository,
    desk: &ReservationDesk,
) -> anyhow::Result<bool> {
    if !books
        .list_books()
        .await
        .context("Failed to list books")?
        .is_empty()
    {
        tracing::info!("Catalog is not empty, skipping sample data");
        return Ok(false);
    }

    let mut book_ids = vec![];
    for (title, author, quantity) in [("Book x", "Author x", 10), ("Book y", "Author y", 5)] {
        let book = books
            .add_book(BookDetails {
                title: title.to_string(),
                author: author.to_string(),
                quantity,
            })
            .await
            .context("Failed to add sample book")?;
        book_ids.push(book.id);
    }

    let mut person_ids = vec![];
    for (name, email) in [("Person x", "x@gmail.com"), ("Person y", "y@gmail.com")] {
        let person = persons
            .add_person(PersonDetails {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await
            .context("Failed to add sample person")?;
        person_ids.push(person.id);
    }

    desk.make_reservation(MakeReservationRequest {
        user_id: person_ids.first().copied(),
        selected_books: Some(book_ids.into_iter().take(1).collect()),
    })
    .await
    .map_err(|err| anyhow::anyhow!("Failed to add sample reservation: {}", err))?;

    tracing::info!("Test data inserted successfully");
    Ok(true)
}

#[cfg(test)]
mod seed_tests {
    use std::sync::Arc;

    use super::*;
    use crate::books_repository::InMemoryBooksRepository;
    use crate::persons_repository::InMemoryPersonsRepository;
    use crate::reservations_repository::{InMemoryReservationsRepository, ReservationsRepository};

    #[tokio::test]
    async fn test_seeds_once() {
        let books = Arc::new(InMemoryBooksRepository::default());
        let persons = Arc::new(InMemoryPersonsRepository::default());
        let reservations = Arc::new(InMemoryReservationsRepository::default());
        let desk = ReservationDesk::new(books.clone(), persons.clone(), reservations.clone());

        assert!(seed_sample_data(books.as_ref(), persons.as_ref(), &desk)
            .await
            .unwrap());
        assert!(!seed_sample_data(books.as_ref(), persons.as_ref(), &desk)
            .await
            .unwrap());

        let catalog = books.list_books().await.unwrap();
        assert_eq!(
            catalog
                .iter()
                .map(|b| (b.title.as_str(), b.quantity))
                .collect::<Vec<_>>(),
            vec![("Book x", 9), ("Book y", 5)]
        );
        assert_eq!(persons.list_persons().await.unwrap().len(), 2);

        let records = reservations.list_reservations().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reservations[0].book_id, catalog[0].id);
    }
}
