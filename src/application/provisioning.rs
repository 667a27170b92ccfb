use super::records::Records;
use crate::domain::decorator::{Decorator, DecoratorPatch};
use crate::domain::ports::Identity;
use crate::domain::record::{Collection, Document, Filter, RecordId, to_document};
use crate::domain::user::{AccountStatus, Role, User, UserPatch};
use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// What happened to the decorator profile after a role change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProfileSync {
    /// A new profile was inserted for the user.
    Created { decorator_id: RecordId },
    /// An existing profile was set active and its display fields refreshed.
    Reactivated { decorator_id: RecordId },
    Disabled,
    /// The user had no active profile to disable.
    Unchanged,
    /// The role was written but the profile could not be synced.
    Failed { reason: String },
}

impl ProfileSync {
    pub fn is_failed(&self) -> bool {
        matches!(self, ProfileSync::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChange {
    pub user: User,
    pub previous_role: Role,
    pub profile: ProfileSync,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSync>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Emails whose profile was created or reactivated.
    pub repaired: Vec<String>,
    /// Emails whose repair failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Keeps decorator profiles consistent with user roles.
///
/// Every write of `role` goes through [`RoleProvisioner::set_user_role`], which
/// persists the user first and then applies the profile cascade. The cascade
/// is best effort: its failure is reported in [`ProfileSync::Failed`] and the
/// role change stands.
#[derive(Clone)]
pub struct RoleProvisioner {
    records: Records,
}

impl RoleProvisioner {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    pub async fn set_user_role(&self, user_id: RecordId, role: Role) -> Result<RoleChange> {
        let user: User = self.records.get(Collection::Users, user_id).await?;
        let previous_role = user.role;
        let now = Utc::now();

        let fields = to_document(&json!({ "role": role, "updatedAt": now }))?;
        let updated = self
            .records
            .update(Collection::Users, &Filter::by_id(user_id), fields)
            .await?;
        if updated.matched == 0 {
            return Err(MarketError::NotFound(format!("user {user_id}")));
        }
        info!(user = %user.email, from = %previous_role, to = %role, "Role updated");

        let user = User {
            role,
            updated_at: now,
            ..user
        };
        let profile = match self.sync_profile(&user, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(user = %user.email, error = %e, "Role updated but decorator profile sync failed");
                ProfileSync::Failed {
                    reason: e.context("decorator profile sync").to_string(),
                }
            }
        };

        Ok(RoleChange {
            user,
            previous_role,
            profile,
        })
    }

    /// Administrative patch; a role in the patch runs the same cascade as
    /// [`RoleProvisioner::set_user_role`].
    pub async fn update_user_fields(&self, user_id: RecordId, patch: UserPatch) -> Result<UserUpdate> {
        if patch.is_empty() {
            return Err(MarketError::InvalidArgument(
                "user update carries no fields".to_string(),
            ));
        }

        let mut user: User = self.records.get(Collection::Users, user_id).await?;
        if let Some(status) = patch.status {
            let now = Utc::now();
            let fields = to_document(&json!({ "status": status, "updatedAt": now }))?;
            self.records
                .update(Collection::Users, &Filter::by_id(user_id), fields)
                .await?;
            info!(user = %user.email, status = status.as_str(), "User status updated");
            user.status = status;
            user.updated_at = now;
        }

        match patch.role {
            Some(role) => {
                let change = self.set_user_role(user_id, role).await?;
                Ok(UserUpdate {
                    user: change.user,
                    profile: Some(change.profile),
                })
            }
            None => Ok(UserUpdate {
                user,
                profile: None,
            }),
        }
    }

    /// Returns the existing account for a verified identity, refreshing its
    /// login time, or registers a new `user`-role account.
    pub async fn register_user(
        &self,
        identity: &Identity,
        name: Option<String>,
        photo_url: Option<String>,
    ) -> Result<User> {
        let filter = Filter::all().with("email", identity.email.as_str());
        let now = Utc::now();

        if let Some(user) = self.records.find_one::<User>(Collection::Users, &filter).await? {
            let fields = to_document(&json!({ "lastLoggedIn": now, "updatedAt": now }))?;
            self.records.update(Collection::Users, &filter, fields).await?;
            return Ok(User {
                last_logged_in: Some(now),
                updated_at: now,
                ..user
            });
        }

        let mut user = User::new(identity.email.as_str(), now);
        user.name = name;
        user.photo_url = photo_url;
        self.records.insert(Collection::Users, &user).await?;
        info!(user = %user.email, "User registered");
        Ok(user)
    }

    /// Re-runs the cascade for every decorator-role user lacking an active
    /// profile.
    pub async fn reconcile_decorator_profiles(&self) -> Result<ReconcileReport> {
        let decorators: Vec<User> = self
            .records
            .find_many(
                Collection::Users,
                &Filter::all().with("role", Role::Decorator.as_str()),
                None,
            )
            .await?;

        let mut report = ReconcileReport::default();
        for user in decorators {
            let active = Filter::all()
                .with("userId", user.email.as_str())
                .with("status", AccountStatus::Active.as_str());
            if self
                .records
                .find_one::<Document>(Collection::Decorators, &active)
                .await?
                .is_some()
            {
                continue;
            }
            match self.activate_profile(&user, Utc::now()).await {
                Ok(_) => report.repaired.push(user.email),
                Err(e) => report.failed.push((user.email, e.to_string())),
            }
        }
        info!(
            repaired = report.repaired.len(),
            failed = report.failed.len(),
            "Decorator profile reconciliation finished"
        );
        Ok(report)
    }

    pub async fn update_decorator(&self, decorator_id: RecordId, patch: DecoratorPatch) -> Result<Decorator> {
        patch.validate()?;
        let mut fields = to_document(&patch)?;
        fields.insert("updatedAt".to_string(), json!(Utc::now()));

        let updated = self
            .records
            .update(Collection::Decorators, &Filter::by_id(decorator_id), fields)
            .await?;
        if updated.matched == 0 {
            return Err(MarketError::NotFound(format!("decorator {decorator_id}")));
        }
        info!(decorator = %decorator_id, "Decorator profile updated");
        self.records.get(Collection::Decorators, decorator_id).await
    }

    pub async fn delete_decorator(&self, decorator_id: RecordId) -> Result<()> {
        let deleted = self
            .records
            .delete(Collection::Decorators, &Filter::by_id(decorator_id))
            .await?;
        if deleted == 0 {
            return Err(MarketError::NotFound(format!("decorator {decorator_id}")));
        }
        info!(decorator = %decorator_id, "Decorator profile deleted");
        Ok(())
    }

    async fn sync_profile(&self, user: &User, now: DateTime<Utc>) -> Result<ProfileSync> {
        if user.role == Role::Decorator {
            return self.activate_profile(user, now).await;
        }

        // Only an active profile is touched, so repeating a demotion writes nothing.
        let active = Filter::all()
            .with("userId", user.email.as_str())
            .with("status", AccountStatus::Active.as_str());
        let fields = to_document(&json!({ "status": AccountStatus::Disabled, "updatedAt": now }))?;
        let updated = self.records.update(Collection::Decorators, &active, fields).await?;
        if updated.matched == 0 {
            return Ok(ProfileSync::Unchanged);
        }
        info!(user = %user.email, "Decorator profile disabled");
        Ok(ProfileSync::Disabled)
    }

    /// Upserts the profile keyed by the user's email. Rating and availability
    /// are only written on insert.
    async fn activate_profile(&self, user: &User, now: DateTime<Utc>) -> Result<ProfileSync> {
        let filter = Filter::all().with("userId", user.email.as_str());
        let on_insert = to_document(&json!({
            "specialty": "",
            "rating": 0,
            "availability": [],
            "createdAt": now,
        }))?;
        let set = to_document(&json!({
            "name": user.profile_name(),
            "profileImage": user.photo_url.clone().unwrap_or_default(),
            "status": AccountStatus::Active,
            "updatedAt": now,
        }))?;

        let result = self
            .records
            .upsert(Collection::Decorators, &filter, on_insert, set)
            .await?;
        if result.upserted {
            info!(user = %user.email, decorator = %result.id, "Decorator profile created");
            Ok(ProfileSync::Created {
                decorator_id: result.id,
            })
        } else {
            info!(user = %user.email, decorator = %result.id, "Decorator profile reactivated");
            Ok(ProfileSync::Reactivated {
                decorator_id: result.id,
            })
        }
    }
}
