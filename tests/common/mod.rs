#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use decor_booking::application::Marketplace;
use decor_booking::config::Settings;
use decor_booking::domain::ports::{RecordStore, RecordStoreRef};
use decor_booking::domain::record::{
    Collection, Document, Filter, RecordId, Sort, UpdateResult, UpsertResult,
};
use decor_booking::domain::service::{NewService, Service};
use decor_booking::domain::user::{Role, User};
use decor_booking::error::{MarketError, Result};
use decor_booking::infrastructure::in_memory::InMemoryRecordStore;
use decor_booking::infrastructure::payment::SimulatedProcessor;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn market_over(store: RecordStoreRef) -> Marketplace {
    Marketplace::new(store, Arc::new(SimulatedProcessor::new()), &Settings::default())
}

pub fn market() -> Marketplace {
    market_over(Arc::new(InMemoryRecordStore::new()))
}

pub async fn add_user(market: &Marketplace, email: &str, name: &str, role: Role) -> User {
    let mut user = User::new(email, Utc::now());
    user.name = Some(name.to_string());
    user.role = role;
    market.records.insert(Collection::Users, &user).await.unwrap();
    user
}

pub async fn add_service(market: &Marketplace, name: &str, cost: Decimal) -> Service {
    market
        .catalog
        .create_service(
            NewService {
                name: name.to_string(),
                cost,
                unit: "per event".to_string(),
                category: "wedding".to_string(),
                description: String::new(),
                image: String::new(),
            },
            "admin@live.com",
        )
        .await
        .unwrap()
}

/// Delegates to an in-memory store but fails every call on one collection
/// while `failing` is set.
pub struct FlakyStore {
    inner: InMemoryRecordStore,
    broken: Collection,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(broken: Collection) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            broken,
            failing: AtomicBool::new(true),
        }
    }

    pub fn heal(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    fn check(&self, collection: Collection) -> Result<()> {
        if collection == self.broken && self.failing.load(Ordering::SeqCst) {
            return Err(MarketError::Unavailable(format!(
                "{} is unreachable",
                collection.name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        self.check(collection)?;
        self.inner.find_one(collection, filter).await
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>> {
        self.check(collection)?;
        self.inner.find_many(collection, filter, sort).await
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<RecordId> {
        self.check(collection)?;
        self.inner.insert_one(collection, doc).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        fields: Document,
    ) -> Result<UpdateResult> {
        self.check(collection)?;
        self.inner.update_one(collection, filter, fields).await
    }

    async fn upsert_one(
        &self,
        collection: Collection,
        filter: &Filter,
        on_insert: Document,
        set: Document,
    ) -> Result<UpsertResult> {
        self.check(collection)?;
        self.inner.upsert_one(collection, filter, on_insert, set).await
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        self.check(collection)?;
        self.inner.delete_one(collection, filter).await
    }
}

pub const SERVICE_ID: &str = "6f1c2b0e-8a4d-4c62-9f0a-0d5b1e7c3a11";
pub const USER_ID: &str = "0b7e9d52-3f4a-4e8c-a1d6-5c2f8e9b4a70";

pub fn write_seed(path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    write!(
        file,
        r#"{{
  "users": [
    {{ "_id": "{USER_ID}", "email": "tuba@live.com", "name": "Tuba", "role": "user" }},
    {{ "email": "rabbi@live.com", "name": "Rabbi", "role": "admin" }}
  ],
  "decorators": [
    {{ "userId": "mim@live.com", "name": "Mim", "rating": 4.8, "status": "active" }},
    {{ "userId": "old@live.com", "name": "Old", "rating": 4.9, "status": "disabled" }}
  ],
  "services": [
    {{ "_id": "{SERVICE_ID}", "service_name": "Wedding Stage Decoration", "cost": 50000, "service_category": "wedding" }}
  ]
}}"#
    )?;
    Ok(())
}
