use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::require_session;
use crate::api::{ApiError, Outcome};
use crate::auth::AuthFlow;
use crate::models::{Category, CategoryKind, UserProfile};
use crate::notification::Notification;

/// Category counts shown on the home view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardSummary {
    pub expense_categories: usize,
    pub income_categories: usize,
}

impl DashboardSummary {
    pub fn from_categories(categories: &[Category]) -> Self {
        categories.iter().fold(Self::default(), |mut acc, c| {
            match c.kind {
                CategoryKind::Expense => acc.expense_categories += 1,
                CategoryKind::Income => acc.income_categories += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.expense_categories + self.income_categories
    }
}

pub struct DashboardScreen {
    flow: Arc<AuthFlow>,
    pub profile: Option<UserProfile>,
    pub summary: Option<DashboardSummary>,
    pub loading: bool,
    pub notification: Option<Notification>,
}

impl DashboardScreen {
    pub fn new(flow: Arc<AuthFlow>) -> Self {
        Self {
            flow,
            profile: None,
            summary: None,
            loading: true,
            notification: None,
        }
    }

    /// Fetch profile and categories concurrently.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.fetch().await;
        self.loading = false;
        result
    }

    async fn fetch(&mut self) -> Result<(), ApiError> {
        self.notification = None;
        if let Err(note) = require_session(&self.flow).await {
            self.notification = Some(note);
            return Ok(());
        }

        let api = self.flow.api();
        let (profile, categories) = futures::join!(api.profile(), api.list_categories());
        let (profile, categories) = (profile?, categories?);

        // One rejection is enough; guarding both would navigate twice.
        let profile = self.flow.guard(profile).await;
        if let Some(failure) = profile.failure().filter(|f| f.is_unauthorized()) {
            self.notification = Some(failure.notification("Failed to load dashboard"));
            return Ok(());
        }
        let categories = self.flow.guard(categories).await;

        match profile {
            Outcome::Success { body, .. } => self.profile = Some(body),
            Outcome::Failure(failure) => {
                self.notification = Some(failure.notification("Failed to load profile"));
            }
        }
        match categories {
            Outcome::Success { body, .. } => {
                let summary = DashboardSummary::from_categories(&body);
                debug!(?summary, "Dashboard summary computed");
                self.summary = Some(summary);
            }
            // The profile error, if any, is the one shown.
            Outcome::Failure(failure) => {
                if self.notification.is_none() {
                    self.notification = Some(failure.notification("Failed to load categories"));
                }
            }
        }
        Ok(())
    }
}
