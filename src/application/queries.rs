use super::records::Records;
use crate::domain::decorator::Decorator;
use crate::domain::payment::Payment;
use crate::domain::record::{Collection, Direction, Filter, Sort};
use crate::domain::user::{AccountStatus, Role, User};
use crate::error::Result;
use tracing::debug;

/// Read-only listings over the record store.
#[derive(Clone)]
pub struct QueryFacade {
    records: Records,
}

impl QueryFacade {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    /// Newest accounts first.
    pub async fn list_users(&self, role: Option<Role>, status: Option<AccountStatus>) -> Result<Vec<User>> {
        debug!(?role, ?status, "Listing users");
        let filter = Filter::all()
            .with_opt("role", role.map(|r| r.as_str()))
            .with_opt("status", status.map(|s| s.as_str()));
        self.records
            .find_many(
                Collection::Users,
                &filter,
                Some(&Sort::by("createdAt", Direction::Descending)),
            )
            .await
    }

    pub async fn list_decorators(&self, status: Option<AccountStatus>) -> Result<Vec<Decorator>> {
        let filter = Filter::all().with_opt("status", status.map(|s| s.as_str()));
        self.records
            .find_many(
                Collection::Decorators,
                &filter,
                Some(&Sort::by("createdAt", Direction::Descending)),
            )
            .await
    }

    /// Active decorators by rating, newest first among equal ratings.
    pub async fn top_decorators(&self, limit: Option<usize>) -> Result<Vec<Decorator>> {
        let filter = Filter::all().with("status", AccountStatus::Active.as_str());
        let sort = Sort::by("rating", Direction::Descending).then("createdAt", Direction::Descending);
        let mut decorators: Vec<Decorator> = self
            .records
            .find_many(Collection::Decorators, &filter, Some(&sort))
            .await?;
        if let Some(limit) = limit {
            decorators.truncate(limit);
        }
        Ok(decorators)
    }

    pub async fn list_payments(&self, user_id: Option<&str>) -> Result<Vec<Payment>> {
        let filter = Filter::all().with_opt("userId", user_id);
        self.records
            .find_many(
                Collection::Payments,
                &filter,
                Some(&Sort::by("createdAt", Direction::Descending)),
            )
            .await
    }
}
