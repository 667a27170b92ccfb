//! Marketplace entities, their invariants, and the ports the engines talk to.

pub mod booking;
pub mod decorator;
pub mod payment;
pub mod ports;
pub mod record;
pub mod service;
pub mod user;
