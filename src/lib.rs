//! Braintree Bridge - checkout-side Braintree integration service
//!
//! This library provides the migration engine that moves a store from the
//! legacy Braintree extension to the new one, and the inbound ENS webhook
//! pipeline that reacts to fraud and dispute events.

pub mod config;
pub mod db;
pub mod ens;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod payments;
pub mod util;
