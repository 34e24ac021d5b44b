mod common;

use std::time::Duration;

use common::{Ticket, recording_store, seed};
use docservice::prelude::*;

#[tokio::test]
async fn cancelled_tokens_fail_before_any_storage_call() {
    let store = recording_store();
    let tickets = store.service::<Ticket>();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = tickets
        .list_page(PaginationRequest::default(), Filter::all(), OrderQuery::None, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentServiceError::Cancelled));

    let err = tickets.insert(Ticket::new(1, "late"), &cancel).await.unwrap_err();
    assert!(matches!(err, DocumentServiceError::Cancelled));

    let err = tickets.next_sequence_number("ticketNo", &cancel).await.unwrap_err();
    assert!(matches!(err, DocumentServiceError::Cancelled));

    assert_eq!(store.backend().calls(), 0);
}

#[tokio::test]
async fn cancelling_mid_flight_abandons_the_page_and_keeps_the_service_usable() {
    let store = recording_store();
    let tickets = store.service::<Ticket>();
    seed(&tickets, 1..=5).await;

    store.backend().set_delay(Duration::from_secs(30));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = tickets
        .list_page(PaginationRequest::default(), Filter::all(), OrderQuery::Asc, Some("ticketNo"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentServiceError::Cancelled));

    store.backend().set_delay(Duration::ZERO);

    let response = tickets
        .list_page(PaginationRequest::default(), Filter::all(), OrderQuery::Asc, Some("ticketNo"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.total_rows, 5);
    assert_eq!(response.data.len(), 5);
}
