use super::payment::PaymentIntent;
use super::record::{Collection, Document, Filter, RecordId, Sort, UpdateResult, UpsertResult};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Durable keyed storage for the marketplace collections.
///
/// Implementations guarantee per-document atomicity and read-your-writes;
/// nothing spans more than one document.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>>;

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>>;

    /// Inserts `doc`, assigning an `_id` when it carries none.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<RecordId>;

    /// Merges `fields` into the first matching document.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpdateResult>;

    /// Merges `set` into the first match, or inserts the filter's equalities
    /// plus `on_insert` plus `set` when nothing matches.
    async fn upsert_one(
        &self,
        collection: Collection,
        filter: &Filter,
        on_insert: Document,
        set: Document,
    ) -> Result<UpsertResult>;

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64>;
}

/// Who a verified credential belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Fails with `Unauthenticated` for a missing or invalid credential.
    async fn verify(&self, credential: &str) -> Result<Identity>;
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// With a `method_ref` the intent is confirmed immediately.
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        method_ref: Option<&str>,
    ) -> Result<PaymentIntent>;

    /// Confirms the intent and returns it as the processor now holds it,
    /// including the amount and currency actually charged.
    async fn confirm(&self, intent_id: &str) -> Result<PaymentIntent>;
}

pub type RecordStoreRef = Arc<dyn RecordStore>;
pub type IdentityVerifierRef = Arc<dyn IdentityVerifier>;
pub type PaymentProcessorRef = Arc<dyn PaymentProcessor>;
