//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, money, errors)
//! - `billing` - Subscriptions, invoices, plans, payment methods and history
//! - `webhook` - Stripe event model, signature verification and audit records

pub mod billing;
pub mod foundation;
pub mod webhook;
