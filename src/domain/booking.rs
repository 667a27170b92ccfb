use super::record::RecordId;
use crate::error::MarketError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle label of a booking.
///
/// `Pending` is initial; `Completed` and `Cancelled` are terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// The transition table. Restating the current state is accepted.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, Assigned) | (Assigned, Completed) | (Pending, Cancelled) | (Assigned, Cancelled)
            )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "assigned" => Ok(BookingStatus::Assigned),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(MarketError::InvalidArgument(format!(
                "unknown booking status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(MarketError::InvalidArgument(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

/// A client's request for a catalog service.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Requester email.
    pub user_id: String,
    pub service_id: RecordId,
    #[serde(rename = "service_name")]
    pub service_name: String,
    /// Cost snapshot taken when the booking was made.
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(default)]
    pub mobile_number: String,
    pub booking_date: NaiveDate,
    #[serde(default)]
    pub event_location: String,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_decorator_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_decorator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Checks a requested status change against the transition table.
    pub fn check_status_change(&self, next: BookingStatus) -> Result<(), MarketError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(MarketError::FailedPrecondition(format!(
                "booking {} cannot move from {} to {}",
                self.id, self.status, next
            )))
        }
    }

    /// Paid is terminal for the payment axis.
    pub fn check_payment_change(&self, next: PaymentStatus) -> Result<(), MarketError> {
        match (self.payment_status, next) {
            (PaymentStatus::Paid, PaymentStatus::Paid) => Err(MarketError::FailedPrecondition(
                format!("booking {} is already paid", self.id),
            )),
            (PaymentStatus::Paid, PaymentStatus::Unpaid) => {
                Err(MarketError::FailedPrecondition(format!(
                    "booking {} is paid and cannot return to unpaid",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Client-supplied fields for a new booking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub user_id: String,
    pub service_id: RecordId,
    pub booking_date: NaiveDate,
    pub event_location: String,
    pub mobile_number: String,
}

/// Partial update of a booking; only supplied fields are written.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_decorator_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_decorator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Filter for booking listings; both fields AND together.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BookingFilter {
    pub user_id: Option<String>,
    pub assigned_decorator_id: Option<RecordId>,
}
