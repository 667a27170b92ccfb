use crate::domain::ports::RecordStoreRef;
use crate::domain::record::{
    Collection, Document, Filter, RecordId, Sort, UpdateResult, UpsertResult, from_document,
    to_document,
};
use crate::error::{MarketError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Awaits `call`, failing with `Unavailable` once `deadline` elapses.
pub async fn bounded<T, F>(deadline: Option<Duration>, what: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        None => call.await,
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            MarketError::Unavailable(format!("{what} timed out after {}ms", limit.as_millis()))
        })?,
    }
}

/// Typed, deadline-bounded access to the record store shared by the engines.
#[derive(Clone)]
pub struct Records {
    store: RecordStoreRef,
    deadline: Option<Duration>,
}

impl Records {
    pub fn new(store: RecordStoreRef, deadline: Option<Duration>) -> Self {
        Self { store, deadline }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub async fn find_one<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<T>> {
        bounded(self.deadline, "record store", self.store.find_one(collection, filter))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Loads a record by id, failing with `NotFound` when absent.
    pub async fn get<T: DeserializeOwned>(&self, collection: Collection, id: RecordId) -> Result<T> {
        self.find_one(collection, &Filter::by_id(id))
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("{} {id}", collection.singular())))
    }

    pub async fn find_many<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<T>> {
        bounded(
            self.deadline,
            "record store",
            self.store.find_many(collection, filter, sort),
        )
        .await?
        .into_iter()
        .map(from_document)
        .collect()
    }

    pub async fn insert<T: Serialize>(&self, collection: Collection, value: &T) -> Result<RecordId> {
        let doc = to_document(value)?;
        bounded(self.deadline, "record store", self.store.insert_one(collection, doc)).await
    }

    pub async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpdateResult> {
        bounded(
            self.deadline,
            "record store",
            self.store.update_one(collection, filter, fields),
        )
        .await
    }

    pub async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        on_insert: Document,
        set: Document,
    ) -> Result<UpsertResult> {
        bounded(
            self.deadline,
            "record store",
            self.store.upsert_one(collection, filter, on_insert, set),
        )
        .await
    }

    pub async fn delete(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        bounded(self.deadline, "record store", self.store.delete_one(collection, filter)).await
    }
}
