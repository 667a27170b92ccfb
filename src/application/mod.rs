//! Application layer orchestrating the marketplace.
//!
//! Each engine owns one concern (role provisioning, the booking lifecycle,
//! the service catalog, read-only listings) and talks to storage only through
//! [`records::Records`], which applies the per-call deadline. [`Marketplace`]
//! wires them over a single store; [`gateway::Gateway`] puts authentication
//! and authorization in front of it.

pub mod bookings;
pub mod catalog;
pub mod gateway;
pub mod provisioning;
pub mod queries;
pub mod records;

use crate::config::Settings;
use crate::domain::ports::{PaymentProcessorRef, RecordStoreRef};
use bookings::BookingEngine;
use catalog::Catalog;
use provisioning::RoleProvisioner;
use queries::QueryFacade;
use records::Records;

/// All engines sharing one record store and processor.
#[derive(Clone)]
pub struct Marketplace {
    pub records: Records,
    pub provisioning: RoleProvisioner,
    pub bookings: BookingEngine,
    pub queries: QueryFacade,
    pub catalog: Catalog,
}

impl Marketplace {
    pub fn new(store: RecordStoreRef, processor: PaymentProcessorRef, settings: &Settings) -> Self {
        let records = Records::new(store, settings.store.call_timeout());
        Self {
            provisioning: RoleProvisioner::new(records.clone()),
            bookings: BookingEngine::new(
                records.clone(),
                processor,
                settings.payments.currency.as_str(),
            ),
            queries: QueryFacade::new(records.clone()),
            catalog: Catalog::new(records.clone()),
            records,
        }
    }
}
