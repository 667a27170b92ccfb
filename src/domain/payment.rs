use super::record::RecordId;
use crate::error::MarketError;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary amount in major currency units worth at least one minor unit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, MarketError> {
        if value <= Decimal::ZERO {
            return Err(MarketError::InvalidArgument(format!(
                "amount must be positive, got {value}"
            )));
        }
        let amount = Self(value);
        if amount.minor_units()? == 0 {
            return Err(MarketError::InvalidArgument(format!(
                "amount {value} is less than one minor unit"
            )));
        }
        Ok(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Amount in the currency's minor unit (cents), rounded half away from zero.
    pub fn minor_units(&self) -> Result<i64, MarketError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| MarketError::InvalidArgument(format!("amount {} is too large", self.0)))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = MarketError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Processor-side state of a payment intent.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    Processing,
    Succeeded,
    Canceled,
}

/// The processor's handle for an in-progress charge attempt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub intent_id: String,
    /// Opaque token a client uses to complete the payment.
    pub client_secret: String,
    pub status: IntentStatus,
    pub amount_minor: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordStatus {
    #[default]
    Succeeded,
}

/// Funds movement tied to a booking. Written once, never updated.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub booking_id: RecordId,
    /// Payer email.
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: String,
    #[serde(default)]
    pub status: PaymentRecordStatus,
    #[serde(default)]
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
