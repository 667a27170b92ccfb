use super::Marketplace;
use super::provisioning::{RoleChange, UserUpdate};
use super::records::bounded;
use crate::domain::booking::{
    Booking, BookingFilter, BookingPatch, BookingStatus, NewBooking, PaymentStatus,
};
use crate::domain::decorator::{Decorator, DecoratorPatch};
use crate::domain::payment::{Payment, PaymentIntent};
use crate::domain::ports::{Identity, IdentityVerifierRef};
use crate::domain::record::{Collection, Filter, RecordId};
use crate::domain::service::{NewService, Service};
use crate::domain::user::{AccountStatus, Role, User, UserPatch};
use crate::error::{MarketError, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Authenticated entry points: verifies the bearer credential, loads the
/// caller's account, checks the role, then dispatches to the engines.
pub struct Gateway {
    market: Marketplace,
    verifier: IdentityVerifierRef,
}

/// A verified caller with a registered, active account.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Identity,
    pub user: User,
}

impl Caller {
    fn require_admin(&self) -> Result<()> {
        if self.user.role == Role::Admin {
            Ok(())
        } else {
            Err(MarketError::PermissionDenied(format!(
                "{} is not an administrator",
                self.user.email
            )))
        }
    }
}

impl Gateway {
    pub fn new(market: Marketplace, verifier: IdentityVerifierRef) -> Self {
        Self { market, verifier }
    }

    async fn verify(&self, credential: &str) -> Result<Identity> {
        bounded(
            self.market.records.deadline(),
            "identity verifier",
            self.verifier.verify(credential),
        )
        .await
    }

    pub async fn authenticate(&self, credential: &str) -> Result<Caller> {
        let identity = self.verify(credential).await?;
        let user: User = self
            .market
            .records
            .find_one(
                Collection::Users,
                &Filter::all().with("email", identity.email.as_str()),
            )
            .await?
            .ok_or_else(|| {
                MarketError::PermissionDenied(format!("no account for {}", identity.email))
            })?;
        if !user.is_active() {
            warn!(user = %user.email, "Disabled account attempted access");
            return Err(MarketError::PermissionDenied(format!(
                "account {} is disabled",
                user.email
            )));
        }
        Ok(Caller { identity, user })
    }

    async fn admin(&self, credential: &str) -> Result<Caller> {
        let caller = self.authenticate(credential).await?;
        caller.require_admin()?;
        Ok(caller)
    }

    /// Registers the verified identity on first sight, otherwise records a login.
    pub async fn sign_in(
        &self,
        credential: &str,
        name: Option<String>,
        photo_url: Option<String>,
    ) -> Result<User> {
        let identity = self.verify(credential).await?;
        self.market
            .provisioning
            .register_user(&identity, name, photo_url)
            .await
    }

    pub async fn set_user_role(&self, credential: &str, user_id: &str, role: &str) -> Result<RoleChange> {
        let user_id: RecordId = user_id.parse()?;
        let role: Role = role.parse()?;
        let caller = self.admin(credential).await?;
        info!(admin = %caller.user.email, user = %user_id, %role, "Role change requested");
        self.market.provisioning.set_user_role(user_id, role).await
    }

    pub async fn update_user(&self, credential: &str, user_id: &str, patch: UserPatch) -> Result<UserUpdate> {
        let user_id: RecordId = user_id.parse()?;
        self.admin(credential).await?;
        self.market.provisioning.update_user_fields(user_id, patch).await
    }

    pub async fn list_users(
        &self,
        credential: &str,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<User>> {
        self.admin(credential).await?;
        self.market.queries.list_users(role, status).await
    }

    pub async fn update_decorator(
        &self,
        credential: &str,
        decorator_id: &str,
        patch: DecoratorPatch,
    ) -> Result<Decorator> {
        let decorator_id: RecordId = decorator_id.parse()?;
        self.admin(credential).await?;
        self.market
            .provisioning
            .update_decorator(decorator_id, patch)
            .await
    }

    pub async fn delete_decorator(&self, credential: &str, decorator_id: &str) -> Result<()> {
        let decorator_id: RecordId = decorator_id.parse()?;
        self.admin(credential).await?;
        self.market.provisioning.delete_decorator(decorator_id).await
    }

    pub async fn create_service(&self, credential: &str, fields: NewService) -> Result<Service> {
        let caller = self.admin(credential).await?;
        self.market
            .catalog
            .create_service(fields, &caller.user.email)
            .await
    }

    pub async fn delete_service(&self, credential: &str, service_id: &str) -> Result<()> {
        let service_id: RecordId = service_id.parse()?;
        self.admin(credential).await?;
        self.market.catalog.delete_service(service_id).await
    }

    /// Books a service for the caller.
    pub async fn book(
        &self,
        credential: &str,
        service_id: &str,
        booking_date: NaiveDate,
        event_location: &str,
        mobile_number: &str,
    ) -> Result<Booking> {
        let service_id: RecordId = service_id.parse()?;
        let caller = self.authenticate(credential).await?;
        self.market
            .bookings
            .create_booking(NewBooking {
                user_id: caller.user.email,
                service_id,
                booking_date,
                event_location: event_location.to_string(),
                mobile_number: mobile_number.to_string(),
            })
            .await
    }

    pub async fn my_bookings(&self, credential: &str) -> Result<Vec<Booking>> {
        let caller = self.authenticate(credential).await?;
        self.market
            .bookings
            .list_bookings(&BookingFilter {
                user_id: Some(caller.user.email),
                assigned_decorator_id: None,
            })
            .await
    }

    /// Bookings assigned to the caller's decorator profile.
    pub async fn assigned_bookings(&self, credential: &str) -> Result<Vec<Booking>> {
        let caller = self.authenticate(credential).await?;
        let profile: Decorator = self
            .market
            .records
            .find_one(
                Collection::Decorators,
                &Filter::all().with("userId", caller.user.email.as_str()),
            )
            .await?
            .ok_or_else(|| {
                MarketError::PermissionDenied(format!(
                    "{} has no decorator profile",
                    caller.user.email
                ))
            })?;
        self.market
            .bookings
            .list_bookings(&BookingFilter {
                user_id: None,
                assigned_decorator_id: Some(profile.id),
            })
            .await
    }

    pub async fn update_booking(&self, credential: &str, booking_id: &str, patch: BookingPatch) -> Result<Booking> {
        let booking_id: RecordId = booking_id.parse()?;
        self.admin(credential).await?;
        self.market.bookings.update_booking(booking_id, patch).await
    }

    /// The requester or an administrator may cancel.
    pub async fn cancel_booking(&self, credential: &str, booking_id: &str) -> Result<Booking> {
        let booking_id: RecordId = booking_id.parse()?;
        let caller = self.authenticate(credential).await?;
        self.owned_booking(&caller, booking_id, true).await?;
        self.market
            .bookings
            .update_booking(
                booking_id,
                BookingPatch {
                    status: Some(BookingStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
    }

    /// Opens a payment intent for the full cost of the caller's booking.
    pub async fn pay_booking(&self, credential: &str, booking_id: &str) -> Result<PaymentIntent> {
        let booking_id: RecordId = booking_id.parse()?;
        let caller = self.authenticate(credential).await?;
        let booking = self.owned_booking(&caller, booking_id, false).await?;
        if booking.payment_status == PaymentStatus::Paid {
            return Err(MarketError::FailedPrecondition(format!(
                "booking {booking_id} is already paid"
            )));
        }
        self.market.bookings.initiate_payment(booking.cost).await
    }

    /// Records the confirmed payment, then marks the booking paid. A failure
    /// of the second write leaves the payment in place and says so.
    pub async fn complete_payment(
        &self,
        credential: &str,
        booking_id: &str,
        intent_id: &str,
        payment_method: &str,
    ) -> Result<Booking> {
        let booking_id: RecordId = booking_id.parse()?;
        let caller = self.authenticate(credential).await?;
        self.owned_booking(&caller, booking_id, false).await?;

        let payment = self
            .market
            .bookings
            .record_payment(booking_id, intent_id, payment_method)
            .await?;
        self.market
            .bookings
            .update_booking(
                booking_id,
                BookingPatch {
                    payment_status: Some(PaymentStatus::Paid),
                    transaction_id: Some(payment.transaction_id),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                warn!(booking = %booking_id, payment = %payment.id, error = %e, "Payment recorded but booking update failed");
                e.context("payment recorded but booking update failed")
            })
    }

    pub async fn my_payments(&self, credential: &str) -> Result<Vec<Payment>> {
        let caller = self.authenticate(credential).await?;
        self.market
            .queries
            .list_payments(Some(caller.user.email.as_str()))
            .await
    }

    async fn owned_booking(&self, caller: &Caller, booking_id: RecordId, admin_allowed: bool) -> Result<Booking> {
        let booking = self.market.bookings.get_booking(booking_id).await?;
        let is_owner = booking.user_id == caller.user.email;
        let is_admin = admin_allowed && caller.user.role == Role::Admin;
        if !is_owner && !is_admin {
            return Err(MarketError::PermissionDenied(format!(
                "booking {booking_id} does not belong to {}",
                caller.user.email
            )));
        }
        Ok(booking)
    }
}
