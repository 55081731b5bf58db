//! REST API access layer for the expense-tracking service.
//!
//! - `ApiGateway`: the one HTTP transport; base URL, timeout, default
//!   bearer credential and request/response logging
//! - `Outcome`: typed success/failure result of every call
//! - `ApiClient`: typed endpoints (login, register, profile, categories)
//!
//! The API uses bearer token authentication obtained from `/users/login`.

pub mod client;
pub mod error;
pub mod gateway;
pub mod outcome;

pub use client::ApiClient;
pub use error::ApiError;
pub use gateway::{ApiGateway, GatewayConfig, RequestDescriptor, DEFAULT_TIMEOUT_MS};
pub use outcome::{Failure, FailureKind, Outcome};
