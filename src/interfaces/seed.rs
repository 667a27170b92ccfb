use crate::application::records::Records;
use crate::domain::booking::Booking;
use crate::domain::decorator::Decorator;
use crate::domain::record::{Collection, Document, Filter, ID_FIELD, RecordId};
use crate::domain::service::Service;
use crate::domain::user::User;
use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::io::Read;
use tracing::info;

/// Initial marketplace contents, one array per collection.
///
/// Entries use the stored field names. `_id`, `createdAt` and `updatedAt`
/// may be omitted and are filled in on load.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<Document>,
    #[serde(default)]
    pub decorators: Vec<Document>,
    #[serde(default)]
    pub services: Vec<Document>,
    #[serde(default)]
    pub bookings: Vec<Document>,
}

/// Records written per collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub decorators: usize,
    pub services: usize,
    pub bookings: usize,
}

impl SeedData {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        serde_json::from_reader(source)
            .map_err(|e| MarketError::InvalidArgument(format!("malformed seed data: {e}")))
    }

    /// Validates every entry against its record type, then inserts them.
    /// Nothing is written when any entry is invalid.
    pub async fn load_into(self, records: &Records) -> Result<SeedSummary> {
        let now = Utc::now();
        let users: Vec<User> = typed(Collection::Users, self.users, now)?;
        let decorators: Vec<Decorator> = typed(Collection::Decorators, self.decorators, now)?;
        let services: Vec<Service> = typed(Collection::Services, self.services, now)?;
        let bookings: Vec<Booking> = typed(Collection::Bookings, self.bookings, now)?;
        check_one_profile_per_user(records, &decorators).await?;

        for user in &users {
            records.insert(Collection::Users, user).await?;
        }
        for decorator in &decorators {
            records.insert(Collection::Decorators, decorator).await?;
        }
        for service in &services {
            records.insert(Collection::Services, service).await?;
        }
        for booking in &bookings {
            records.insert(Collection::Bookings, booking).await?;
        }

        let summary = SeedSummary {
            users: users.len(),
            decorators: decorators.len(),
            services: services.len(),
            bookings: bookings.len(),
        };
        info!(?summary, "Seed data loaded");
        Ok(summary)
    }
}

/// A user owns at most one decorator profile, seeded or already stored.
async fn check_one_profile_per_user(records: &Records, decorators: &[Decorator]) -> Result<()> {
    let mut seen = HashSet::new();
    for decorator in decorators {
        if !seen.insert(decorator.user_id.as_str()) {
            return Err(MarketError::InvalidArgument(format!(
                "seed has more than one decorator profile for {}",
                decorator.user_id
            )));
        }
        let existing: Option<Decorator> = records
            .find_one(
                Collection::Decorators,
                &Filter::all().with("userId", decorator.user_id.as_str()),
            )
            .await?;
        if existing.is_some() {
            return Err(MarketError::InvalidArgument(format!(
                "decorator profile for {} already exists",
                decorator.user_id
            )));
        }
    }
    Ok(())
}

fn typed<T: DeserializeOwned>(
    collection: Collection,
    entries: Vec<Document>,
    now: DateTime<Utc>,
) -> Result<Vec<T>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, mut doc)| {
            doc.entry(ID_FIELD).or_insert_with(|| json!(RecordId::new()));
            doc.entry("createdAt").or_insert_with(|| json!(now));
            doc.entry("updatedAt").or_insert_with(|| json!(now));
            serde_json::from_value(Value::Object(doc)).map_err(|e| {
                MarketError::InvalidArgument(format!(
                    "{} entry {index} is invalid: {e}",
                    collection.singular()
                ))
            })
        })
        .collect()
}
