use crate::domain::ports::RecordStore;
use crate::domain::record::{
    Collection, Document, Filter, ID_FIELD, RecordId, Sort, UpdateResult, UpsertResult,
    document_id, merge_fields, upsert_document,
};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory record store.
///
/// Documents live in insertion order per collection behind one `RwLock`, so
/// every write (upserts included) is atomic with respect to readers.
/// Ideal for testing or for running against a seed file.
#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryRecordStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn with_id(mut doc: Document) -> Result<(RecordId, Document)> {
    let id = match doc.get(ID_FIELD) {
        Some(_) => document_id(&doc)?,
        None => {
            let id = RecordId::new();
            doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            id
        }
    };
    Ok((id, doc))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        if let Some(sort) = sort {
            sort.apply(&mut found);
        }
        Ok(found)
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<RecordId> {
        let (id, doc) = with_id(doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| Filter::by_id(id).matches(d)) {
            return Err(MarketError::FailedPrecondition(format!(
                "duplicate id {id} in {collection}"
            )));
        }
        docs.push(doc);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpdateResult> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(UpdateResult::default());
        };
        let modified = merge_fields(doc, &fields);
        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn upsert_one(
        &self,
        collection: Collection,
        filter: &Filter,
        on_insert: Document,
        set: Document,
    ) -> Result<UpsertResult> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if let Some(doc) = docs.iter_mut().find(|d| filter.matches(d)) {
            merge_fields(doc, &set);
            return Ok(UpsertResult {
                upserted: false,
                id: document_id(doc)?,
            });
        }
        let doc = upsert_document(filter, on_insert, set);
        let id = document_id(&doc)?;
        docs.push(doc);
        Ok(UpsertResult { upserted: true, id })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
