//! Application handlers.
//!
//! - `webhook` - Stripe webhook routing and reconciliation

pub mod webhook;
