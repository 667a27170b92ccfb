use crate::domain::payment::{IntentStatus, PaymentIntent};
use crate::domain::ports::PaymentProcessor;
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Method reference the simulated processor always declines.
pub const DECLINED_METHOD: &str = "pm_card_declined";

/// An in-process stand-in for a card processor.
///
/// Intents created without a method wait for `confirm`, which succeeds unless
/// the intent was canceled. Intents created with a method are confirmed on the
/// spot; a method listed in `declined` fails with the processor's message.
#[derive(Clone)]
pub struct SimulatedProcessor {
    intents: Arc<RwLock<HashMap<String, PaymentIntent>>>,
    declined: Arc<HashSet<String>>,
}

impl Default for SimulatedProcessor {
    fn default() -> Self {
        Self::with_declined([DECLINED_METHOD])
    }
}

impl SimulatedProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_declined<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            intents: Arc::default(),
            declined: Arc::new(methods.into_iter().map(Into::into).collect()),
        }
    }

    /// Marks an intent as abandoned so later confirmations fail.
    pub async fn cancel(&self, intent_id: &str) -> Result<()> {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| MarketError::NotFound(format!("payment intent {intent_id}")))?;
        intent.status = IntentStatus::Canceled;
        Ok(())
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        method_ref: Option<&str>,
    ) -> Result<PaymentIntent> {
        if amount_minor <= 0 {
            return Err(MarketError::Processor(format!(
                "amount must be at least one minor unit, got {amount_minor}"
            )));
        }
        if let Some(method) = method_ref
            && self.declined.contains(method)
        {
            return Err(MarketError::Processor("Your card was declined.".to_string()));
        }

        let intent_id = format!("pi_{}", Uuid::new_v4().simple());
        let client_secret = format!("{intent_id}_secret_{}", Uuid::new_v4().simple());
        let status = match method_ref {
            Some(_) => IntentStatus::Succeeded,
            None => IntentStatus::RequiresPaymentMethod,
        };
        let intent = PaymentIntent {
            intent_id: intent_id.clone(),
            client_secret,
            status,
            amount_minor,
            currency: currency.to_lowercase(),
            method_ref: method_ref.map(str::to_string),
        };
        self.intents.write().await.insert(intent_id, intent.clone());
        Ok(intent)
    }

    async fn confirm(&self, intent_id: &str) -> Result<PaymentIntent> {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| MarketError::NotFound(format!("payment intent {intent_id}")))?;
        if intent.status != IntentStatus::Canceled {
            intent.status = IntentStatus::Succeeded;
        }
        Ok(intent.clone())
    }
}
