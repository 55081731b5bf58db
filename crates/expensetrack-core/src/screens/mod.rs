//! Non-rendering controllers for each view of the client.
//!
//! A screen owns its loading flag, its data and the last notification to
//! show. Every API outcome goes through [`AuthFlow::guard`] so a rejected
//! credential is handled the same way everywhere.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod profile;

pub use auth::{AuthForm, AuthMode, AuthScreen};
pub use categories::CategoriesScreen;
pub use dashboard::{DashboardScreen, DashboardSummary};
pub use profile::ProfileScreen;

use crate::auth::AuthFlow;
use crate::notification::Notification;

/// Views behind the login wall call this first. Without a session the user
/// is sent to authentication and no request is made.
pub(crate) async fn require_session(flow: &AuthFlow) -> Result<(), Notification> {
    if flow.is_authenticated().await {
        Ok(())
    } else {
        flow.navigator().to_authentication();
        Err(Notification::error("Please login to continue"))
    }
}
