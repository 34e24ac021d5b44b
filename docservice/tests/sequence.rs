mod common;

use common::{Invoice, Ticket, memory_store, seed};
use docservice::prelude::*;

#[tokio::test]
async fn empty_collections_start_at_one() {
    let store = memory_store();
    let tickets = store.service::<Ticket>();

    let next = tickets
        .next_sequence_number("ticketNo", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(next, 1);
}

#[tokio::test]
async fn next_number_follows_the_largest_value() {
    let store = memory_store();
    let tickets = store.service::<Ticket>();
    let cancel = CancellationToken::new();
    seed(&tickets, [5, 12, 3]).await;

    assert_eq!(tickets.next_sequence_number("ticketNo", &cancel).await.unwrap(), 13);

    seed(&tickets, [13]).await;
    assert_eq!(tickets.next_sequence_number("ticketNo", &cancel).await.unwrap(), 14);
}

#[tokio::test]
async fn numeric_text_is_accepted_and_other_text_restarts() {
    let store = memory_store();
    let invoices = store.service::<Invoice>();
    let cancel = CancellationToken::new();

    let invoice = |number: &str| Invoice {
        id: None,
        number: number.to_string(),
        audit: AuditTrail::created_by("billing"),
    };

    invoices.insert(invoice("41"), &cancel).await.unwrap();
    assert_eq!(invoices.next_sequence_number("number", &cancel).await.unwrap(), 42);

    invoices.insert(invoice("INV-9"), &cancel).await.unwrap();
    assert_eq!(invoices.next_sequence_number("number", &cancel).await.unwrap(), 1);
}

#[tokio::test]
async fn blank_sequence_fields_are_rejected() {
    let store = memory_store();
    let tickets = store.service::<Ticket>();

    let err = tickets
        .next_sequence_number(" ", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentServiceError::InvalidOrder(_)));
}

#[tokio::test]
async fn exhausted_sequences_fail_instead_of_restarting() {
    let store = memory_store();
    let tickets = store.service::<Ticket>();
    seed(&tickets, [i64::MAX]).await;

    let err = tickets
        .next_sequence_number("ticketNo", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentServiceError::InvalidDocument(_)));
}
