#![allow(dead_code)]

use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use docservice::{
    bson::Bson,
    memory::InMemoryStore,
    prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub ticket_no: i64,
    pub title: String,
    pub status: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Ticket {
    pub fn new(ticket_no: i64, title: &str) -> Self {
        Self {
            id: None,
            ticket_no,
            title: title.to_string(),
            status: true,
            timestamps: Timestamps::now(),
        }
    }
}

impl Document for Ticket {
    fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn collection_name() -> &'static str {
        "tickets"
    }

    fn mark_modified(&mut self, at: DateTime<Utc>) {
        self.timestamps.touch(at);
    }

    fn status(&self) -> Option<bool> {
        Some(self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketSummary {
    pub number: i64,
}

impl From<Ticket> for TicketSummary {
    fn from(ticket: Ticket) -> Self {
        Self { number: ticket.ticket_no }
    }
}

/// Invoice numbers are stored as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub number: String,
    #[serde(flatten)]
    pub audit: AuditTrail,
}

impl Document for Invoice {
    fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn collection_name() -> &'static str {
        "invoices"
    }

    fn mark_modified(&mut self, at: DateTime<Utc>) {
        self.audit.touch(at);
    }
}

/// Wraps the in-memory store, counting storage calls and optionally delaying each.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: InMemoryStore,
    calls: AtomicUsize,
    delay_ms: AtomicU64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl StoreBackend for RecordingBackend {
    async fn insert_document(&self, document: Bson, collection: &str) -> DocumentServiceResult<DocumentId> {
        self.enter().await;
        self.inner.insert_document(document, collection).await
    }

    async fn replace_document(
        &self,
        id: &DocumentId,
        document: Bson,
        collection: &str,
    ) -> DocumentServiceResult<bool> {
        self.enter().await;
        self.inner.replace_document(id, document, collection).await
    }

    async fn delete_document(&self, id: &DocumentId, collection: &str) -> DocumentServiceResult<bool> {
        self.enter().await;
        self.inner.delete_document(id, collection).await
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentServiceResult<Vec<Bson>> {
        self.enter().await;
        self.inner.find_documents(query, collection).await
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentServiceResult<u64> {
        self.enter().await;
        self.inner.count_documents(filter, collection).await
    }
}

pub fn memory_store() -> DocumentStore<InMemoryStore> {
    DocumentStore::new(InMemoryStore::new())
}

pub fn recording_store() -> DocumentStore<RecordingBackend> {
    DocumentStore::new(RecordingBackend::new())
}

/// Inserts one ticket per number, in the given order.
pub async fn seed<B: StoreBackend + ?Sized>(service: &DocumentService<Ticket, B>, numbers: impl IntoIterator<Item = i64>) {
    let cancel = CancellationToken::new();

    for n in numbers {
        service
            .insert(Ticket::new(n, &format!("ticket {n}")), &cancel)
            .await
            .unwrap();
    }
}

pub fn numbers(tickets: &[Ticket]) -> Vec<i64> {
    tickets.iter().map(|ticket| ticket.ticket_no).collect()
}
