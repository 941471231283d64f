//! Billing Reconciler - Stripe webhook ingestion
//!
//! Verifies signed Stripe deliveries, routes each event to a reconciliation
//! handler that brings local subscription and invoice records in line with
//! Stripe, and keeps an audit trail of every processed event.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
