use crate::domain::ports::RecordStore;
use crate::domain::record::{
    Collection, Document, Filter, ID_FIELD, RecordId, Sort, UpdateResult, UpsertResult,
    document_id, merge_fields, upsert_document,
};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A persistent record store backed by RocksDB.
///
/// Each collection lives in its own column family, keyed by the 16 raw bytes
/// of the document id, with JSON values. Writes that read before they write
/// (update, upsert, delete) are serialized through `write_lock` so each is
/// atomic per document.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbRecordStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbRecordStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring a
    /// column family exists for every collection.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = Collection::ALL
            .iter()
            .map(|c| ColumnFamilyDescriptor::new(c.name(), Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn scan(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        let cf = self.db.cf_handle(collection.name()).ok_or_else(|| {
            MarketError::InternalError(format!("column family {collection} not found").into())
        })?;

        let mut docs = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let doc: Document = serde_json::from_slice(&value)?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn first_match(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        // Identity lookups go straight to the key.
        if let Some(id) = single_id(filter) {
            return self.get(collection, id);
        }
        Ok(self.scan(collection, filter)?.into_iter().next())
    }

    fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Document>> {
        let cf = self.db.cf_handle(collection.name()).ok_or_else(|| {
            MarketError::InternalError(format!("column family {collection} not found").into())
        })?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, collection: Collection, doc: &Document) -> Result<RecordId> {
        let cf = self.db.cf_handle(collection.name()).ok_or_else(|| {
            MarketError::InternalError(format!("column family {collection} not found").into())
        })?;
        let id = document_id(doc)?;
        self.db.put_cf(cf, id.as_bytes(), serde_json::to_vec(doc)?)?;
        Ok(id)
    }
}

/// The id of a filter that is exactly `{_id: <id>}`.
fn single_id(filter: &Filter) -> Option<RecordId> {
    let mut equalities = filter.equalities();
    match (equalities.next(), equalities.next()) {
        (Some((ID_FIELD, Value::String(s))), None) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl RecordStore for RocksDbRecordStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        self.first_match(collection, filter)
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>> {
        let mut docs = self.scan(collection, filter)?;
        if let Some(sort) = sort {
            sort.apply(&mut docs);
        }
        Ok(docs)
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<RecordId> {
        let _guard = self.write_lock.lock().await;
        if !doc.contains_key(ID_FIELD) {
            doc.insert(ID_FIELD.to_string(), Value::String(RecordId::new().to_string()));
        }
        let id = document_id(&doc)?;
        if self.get(collection, id)?.is_some() {
            return Err(MarketError::FailedPrecondition(format!(
                "duplicate id {id} in {collection}"
            )));
        }
        self.put(collection, &doc)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpdateResult> {
        let _guard = self.write_lock.lock().await;
        let Some(mut doc) = self.first_match(collection, filter)? else {
            return Ok(UpdateResult::default());
        };
        let modified = merge_fields(&mut doc, &fields);
        if modified {
            self.put(collection, &doc)?;
        }
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
        let _guard = self.write_lock.lock().await;
        if let Some(mut doc) = self.first_match(collection, filter)? {
            if merge_fields(&mut doc, &set) {
                self.put(collection, &doc)?;
            }
            return Ok(UpsertResult {
                upserted: false,
                id: document_id(&doc)?,
            });
        }
        let doc = upsert_document(filter, on_insert, set);
        let id = self.put(collection, &doc)?;
        Ok(UpsertResult { upserted: true, id })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let Some(doc) = self.first_match(collection, filter)? else {
            return Ok(0);
        };
        let cf = self.db.cf_handle(collection.name()).ok_or_else(|| {
            MarketError::InternalError(format!("column family {collection} not found").into())
        })?;
        self.db.delete_cf(cf, document_id(&doc)?.as_bytes())?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(v: Value) -> Document {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbRecordStore::open(dir.path()).expect("Failed to open RocksDB");

        for collection in Collection::ALL {
            assert!(store.db.cf_handle(collection.name()).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_upsert_and_find() {
        let dir = tempdir().unwrap();
        let store = RocksDbRecordStore::open(dir.path()).unwrap();
        let filter = Filter::all().with("userId", "reza@live.com");

        let first = store
            .upsert_one(
                Collection::Decorators,
                &filter,
                doc(json!({"rating": 0})),
                doc(json!({"status": "active"})),
            )
            .await
            .unwrap();
        assert!(first.upserted);

        let second = store
            .upsert_one(
                Collection::Decorators,
                &filter,
                Document::new(),
                doc(json!({"status": "disabled"})),
            )
            .await
            .unwrap();
        assert!(!second.upserted);
        assert_eq!(first.id, second.id);

        let by_id = store
            .find_one(Collection::Decorators, &Filter::by_id(first.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id["status"], "disabled");
    }

    #[tokio::test]
    async fn test_rocksdb_reopen_keeps_documents() {
        let dir = tempdir().unwrap();
        let id = {
            let store = RocksDbRecordStore::open(dir.path()).unwrap();
            store
                .insert_one(Collection::Bookings, doc(json!({"userId": "tuba@live.com"})))
                .await
                .unwrap()
        };

        let store = RocksDbRecordStore::open(dir.path()).unwrap();
        let found = store
            .find_many(Collection::Bookings, &Filter::all().with("userId", "tuba@live.com"), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(document_id(&found[0]).unwrap(), id);
    }
}
