use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::domain::{CategoryId, LeaveCategory};
use super::error::LeaveServiceError;
use super::store::{LeaveStore, StoreError};

/// Fields accepted when creating or replacing a category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub annual_days: Option<u32>,
    #[serde(default)]
    pub paid: bool,
}

/// CRUD over leave categories. The stored `annual_days` is reference data only.
pub struct CategoryRegistry<S> {
    store: Arc<S>,
}

impl<S> CategoryRegistry<S>
where
    S: LeaveStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<LeaveCategory, LeaveServiceError> {
        LeaveServiceError::ensure_category_key(&id)?;
        let category = self.store.insert_category(LeaveCategory {
            id,
            name: draft.name,
            annual_days: draft.annual_days,
            paid: draft.paid,
        })?;
        info!(category_id = %category.id, "leave category created");
        Ok(category)
    }

    pub fn get(&self, id: &CategoryId) -> Result<LeaveCategory, LeaveServiceError> {
        self.store
            .fetch_category(id)?
            .ok_or_else(|| LeaveServiceError::category_not_found(id.0.clone()))
    }

    /// Sorted by name.
    pub fn list(&self) -> Result<Vec<LeaveCategory>, LeaveServiceError> {
        Ok(self.store.list_categories()?)
    }

    pub fn update(
        &self,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<LeaveCategory, LeaveServiceError> {
        self.store
            .update_category(LeaveCategory {
                id,
                name: draft.name,
                annual_days: draft.annual_days,
                paid: draft.paid,
            })
            .map_err(category_error)
    }

    pub fn delete(&self, id: &CategoryId) -> Result<(), LeaveServiceError> {
        self.store.delete_category(id).map_err(category_error)?;
        info!(category_id = %id, "leave category deleted");
        Ok(())
    }
}

fn category_error(err: StoreError) -> LeaveServiceError {
    match err {
        StoreError::NotFound(id) => LeaveServiceError::category_not_found(id),
        other => other.into(),
    }
}
