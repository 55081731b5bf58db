use std::sync::Arc;

use tracing::debug;

use super::require_session;
use crate::api::{ApiError, Outcome};
use crate::auth::AuthFlow;
use crate::models::{Category, CategoryForm};
use crate::notification::Notification;

/// Category list plus the "add category" form.
pub struct CategoriesScreen {
    flow: Arc<AuthFlow>,
    pub categories: Vec<Category>,
    pub loading: bool,
    pub form: CategoryForm,
    pub notification: Option<Notification>,
}

impl CategoriesScreen {
    pub fn new(flow: Arc<AuthFlow>) -> Self {
        Self {
            flow,
            categories: Vec::new(),
            loading: true,
            form: CategoryForm::default(),
            notification: None,
        }
    }

    /// Reload the list from the server.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.fetch().await;
        self.loading = false;
        result
    }

    async fn fetch(&mut self) -> Result<(), ApiError> {
        if let Err(note) = require_session(&self.flow).await {
            self.notification = Some(note);
            return Ok(());
        }

        let outcome = self.flow.api().list_categories().await?;
        match self.flow.guard(outcome).await {
            Outcome::Success { body, .. } => {
                debug!(count = body.len(), "Categories loaded");
                self.categories = body;
            }
            Outcome::Failure(failure) => {
                self.notification = Some(failure.notification("Failed to load categories"));
            }
        }
        Ok(())
    }

    /// Submit the form. On success the form resets and the list reloads;
    /// on failure the list is left as it was.
    pub async fn add(&mut self) -> Result<(), ApiError> {
        if let Err(note) = require_session(&self.flow).await {
            self.notification = Some(note);
            return Ok(());
        }

        let outcome = self.flow.api().add_category(&self.form).await?;
        match self.flow.guard(outcome).await {
            Outcome::Success { .. } => {
                self.form = CategoryForm::default();
                self.notification = Some(Notification::success("Category added successfully"));
                self.refresh().await
            }
            Outcome::Failure(failure) => {
                self.notification = Some(failure.notification("Failed to add category"));
                Ok(())
            }
        }
    }
}
