//! Adapters - Implementations of ports for external systems.
//!
//! - `http` - axum endpoints for Stripe webhook delivery
//! - `memory` - in-memory stores for tests and database-less runs
//! - `postgres` - sqlx-backed stores

pub mod http;
pub mod memory;
pub mod postgres;
