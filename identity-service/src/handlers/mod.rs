//! HTTP handlers for identity-service.

pub mod auth;
pub mod health;
pub mod metrics;
