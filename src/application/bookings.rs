use super::records::{Records, bounded};
use crate::domain::booking::{
    Booking, BookingFilter, BookingPatch, BookingStatus, NewBooking, PaymentStatus,
};
use crate::domain::decorator::Decorator;
use crate::domain::payment::{Amount, IntentStatus, Payment, PaymentIntent, PaymentRecordStatus};
use crate::domain::ports::PaymentProcessorRef;
use crate::domain::record::{Collection, Direction, Filter, RecordId, Sort, to_document};
use crate::domain::service::Service;
use crate::error::{MarketError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info};

/// Moves bookings through their lifecycle and reconciles them with the
/// payment processor.
///
/// A booking only becomes `paid` once a [`Payment`] confirmed by the processor
/// has been recorded for it, and only active decorators can be assigned.
#[derive(Clone)]
pub struct BookingEngine {
    records: Records,
    processor: PaymentProcessorRef,
    currency: String,
}

impl BookingEngine {
    pub fn new(records: Records, processor: PaymentProcessorRef, currency: impl Into<String>) -> Self {
        Self {
            records,
            processor,
            currency: currency.into(),
        }
    }

    pub async fn create_booking(&self, request: NewBooking) -> Result<Booking> {
        if request.user_id.trim().is_empty() {
            return Err(MarketError::InvalidArgument(
                "booking requires a requester".to_string(),
            ));
        }
        let service: Service = self
            .records
            .get(Collection::Services, request.service_id)
            .await?;
        if service.cost.is_sign_negative() {
            return Err(MarketError::FailedPrecondition(format!(
                "service {} has a negative cost",
                service.id
            )));
        }

        let now = Utc::now();
        let booking = Booking {
            id: RecordId::new(),
            user_id: request.user_id,
            service_id: service.id,
            service_name: service.name,
            cost: service.cost,
            mobile_number: request.mobile_number,
            booking_date: request.booking_date,
            event_location: request.event_location,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            assigned_decorator_id: None,
            assigned_decorator_name: None,
            transaction_id: None,
            paid_at: None,
            payment_method: None,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(Collection::Bookings, &booking).await?;
        info!(booking = %booking.id, user = %booking.user_id, service = %booking.service_id, "Booking created");
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: RecordId) -> Result<Booking> {
        self.records.get(Collection::Bookings, booking_id).await
    }

    /// Newest first.
    pub async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let query = Filter::all()
            .with_opt("userId", filter.user_id.as_deref())
            .with_opt(
                "assignedDecoratorId",
                filter.assigned_decorator_id.map(|id| id.to_string()),
            );
        debug!(?filter, "Listing bookings");
        self.records
            .find_many(
                Collection::Bookings,
                &query,
                Some(&Sort::by("createdAt", Direction::Descending)),
            )
            .await
    }

    /// Applies the supplied fields after checking them against the lifecycle.
    pub async fn update_booking(&self, booking_id: RecordId, mut patch: BookingPatch) -> Result<Booking> {
        if patch.is_empty() {
            return Err(MarketError::InvalidArgument(
                "booking update carries no fields".to_string(),
            ));
        }
        let booking = self.get_booking(booking_id).await?;

        if let Some(status) = patch.status {
            booking.check_status_change(status)?;
            if status == BookingStatus::Assigned
                && patch.assigned_decorator_id.is_none()
                && booking.assigned_decorator_id.is_none()
            {
                return Err(MarketError::FailedPrecondition(format!(
                    "booking {booking_id} has no decorator to be assigned to"
                )));
            }
        }

        if let Some(decorator_id) = patch.assigned_decorator_id {
            if booking.status.is_terminal() {
                return Err(MarketError::FailedPrecondition(format!(
                    "booking {booking_id} is {} and cannot be reassigned",
                    booking.status
                )));
            }
            let decorator: Decorator = self.records.get(Collection::Decorators, decorator_id).await?;
            if !decorator.is_active() {
                return Err(MarketError::FailedPrecondition(format!(
                    "decorator {decorator_id} is not active"
                )));
            }
            patch.assigned_decorator_name.get_or_insert(decorator.name);
        }

        if let Some(payment_status) = patch.payment_status {
            booking.check_payment_change(payment_status)?;
            if payment_status == PaymentStatus::Paid {
                let payment = self.confirmed_payment(booking_id).await?.ok_or_else(|| {
                    MarketError::FailedPrecondition(format!(
                        "booking {booking_id} has no confirmed payment"
                    ))
                })?;
                match &patch.transaction_id {
                    Some(txn) if *txn != payment.transaction_id => {
                        return Err(MarketError::FailedPrecondition(format!(
                            "transaction {txn} is not the confirmed payment for booking {booking_id}"
                        )));
                    }
                    _ => {}
                }
                patch.transaction_id.get_or_insert(payment.transaction_id);
                patch.paid_at.get_or_insert(payment.created_at);
                if !payment.payment_method.is_empty() {
                    patch.payment_method.get_or_insert(payment.payment_method);
                }
            }
        }

        let mut fields = to_document(&patch)?;
        fields.insert("updatedAt".to_string(), json!(Utc::now()));
        let updated = self
            .records
            .update(Collection::Bookings, &Filter::by_id(booking_id), fields)
            .await?;
        if updated.matched == 0 {
            return Err(MarketError::NotFound(format!("booking {booking_id}")));
        }
        info!(booking = %booking_id, ?patch, "Booking updated");
        self.get_booking(booking_id).await
    }

    /// Opens a payment intent in the settlement currency. Bookings are not
    /// touched; the returned `client_secret` is handed to the paying client.
    pub async fn initiate_payment(&self, amount: Decimal) -> Result<PaymentIntent> {
        let amount = Amount::new(amount)?;
        let intent = bounded(
            self.records.deadline(),
            "payment processor",
            self.processor
                .create_intent(amount.minor_units()?, &self.currency, None),
        )
        .await?;
        info!(intent = %intent.intent_id, %amount, currency = %self.currency, "Payment intent created");
        Ok(intent)
    }

    /// Creates and confirms a charge in one call. Processor failures are
    /// returned as-is, without retry.
    pub async fn charge_and_record(&self, method_ref: &str, amount: Decimal) -> Result<PaymentIntent> {
        if method_ref.trim().is_empty() {
            return Err(MarketError::InvalidArgument(
                "payment method reference is required".to_string(),
            ));
        }
        let amount = Amount::new(amount)?;
        let intent = bounded(
            self.records.deadline(),
            "payment processor",
            self.processor
                .create_intent(amount.minor_units()?, &self.currency, Some(method_ref)),
        )
        .await?;
        info!(intent = %intent.intent_id, %amount, status = ?intent.status, "Charge created");
        Ok(intent)
    }

    /// Confirms `intent_id` with the processor and, on success, writes the
    /// booking's payment record. The booking itself is updated separately.
    pub async fn record_payment(
        &self,
        booking_id: RecordId,
        intent_id: &str,
        payment_method: &str,
    ) -> Result<Payment> {
        if intent_id.trim().is_empty() {
            return Err(MarketError::InvalidArgument(
                "payment intent id is required".to_string(),
            ));
        }
        let booking = self.get_booking(booking_id).await?;
        if booking.payment_status == PaymentStatus::Paid {
            return Err(MarketError::FailedPrecondition(format!(
                "booking {booking_id} is already paid"
            )));
        }
        if self.confirmed_payment(booking_id).await?.is_some() {
            return Err(MarketError::FailedPrecondition(format!(
                "booking {booking_id} already has a recorded payment"
            )));
        }
        let already_used: Option<Payment> = self
            .records
            .find_one(
                Collection::Payments,
                &Filter::all().with("transactionId", intent_id),
            )
            .await?;
        if let Some(used) = already_used {
            return Err(MarketError::FailedPrecondition(format!(
                "payment intent {intent_id} is already recorded for booking {}",
                used.booking_id
            )));
        }
        let due = Amount::new(booking.cost)?.minor_units()?;

        let intent = bounded(
            self.records.deadline(),
            "payment processor",
            self.processor.confirm(intent_id),
        )
        .await?;
        if intent.status != IntentStatus::Succeeded {
            return Err(MarketError::FailedPrecondition(format!(
                "payment intent {intent_id} is {:?}, not succeeded",
                intent.status
            )));
        }
        if intent.amount_minor != due {
            return Err(MarketError::FailedPrecondition(format!(
                "payment intent {intent_id} charged {} minor units, booking {booking_id} costs {due}",
                intent.amount_minor
            )));
        }
        if !intent.currency.eq_ignore_ascii_case(&self.currency) {
            return Err(MarketError::FailedPrecondition(format!(
                "payment intent {intent_id} is in {}, expected {}",
                intent.currency, self.currency
            )));
        }

        let now = Utc::now();
        let payment = Payment {
            id: RecordId::new(),
            booking_id,
            user_id: booking.user_id,
            amount: Decimal::new(intent.amount_minor, 2).normalize(),
            currency: intent.currency,
            transaction_id: intent.intent_id,
            status: PaymentRecordStatus::Succeeded,
            payment_method: payment_method.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.records.insert(Collection::Payments, &payment).await?;
        info!(booking = %booking_id, payment = %payment.id, transaction = %intent_id, "Payment recorded");
        Ok(payment)
    }

    async fn confirmed_payment(&self, booking_id: RecordId) -> Result<Option<Payment>> {
        self.records
            .find_one(
                Collection::Payments,
                &Filter::all()
                    .with("bookingId", booking_id.to_string())
                    .with("status", "succeeded"),
            )
            .await
    }
}
