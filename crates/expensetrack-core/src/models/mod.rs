//! Data models for expense-tracker entities.
//!
//! - `AuthResponse`, `LoginCredentials`, `RegisterCredentials`: auth exchange
//! - `UserProfile`: the signed-in user's display identity
//! - `Category`, `CategoryForm`, `CategoryKind`: expense/income categories
//!
//! Server payloads are converted into these types at an explicit boundary;
//! malformed payloads are rejected instead of producing half-filled values.

pub mod auth;
pub mod category;
pub mod profile;

pub use auth::{AuthResponse, LoginCredentials, RegisterCredentials};
pub use category::{parse_categories, Category, CategoryForm, CategoryKind};
pub use profile::UserProfile;
