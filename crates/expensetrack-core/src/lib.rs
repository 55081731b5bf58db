//! Expensetrack Core - Shared library for the expense tracker client.
//!
//! This crate contains the API gateway, session persistence, authentication
//! flow, data models and the non-rendering view controllers used by the
//! command-line front end.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notification;
pub mod screens;
pub mod utils;

#[cfg(test)]
mod testutil;

pub use api::{ApiClient, ApiError, ApiGateway, Failure, FailureKind, GatewayConfig, Outcome};
pub use auth::{AuthFlow, AuthState, Navigator, SessionStore};
pub use config::{Config, SessionBackend};
pub use notification::{Notification, NotificationKind};
