use async_trait::async_trait;
use dosealert_models::drug::{Drug, DrugCategory, DrugCategoryId, DrugId};

use crate::StorageError;

/// Drug categories and the drugs filed under them. Patients are onboarded
/// with a category and drug picked from this catalog.
#[async_trait]
pub trait DrugCatalog: Send + Sync {
    /// Every category with its drugs, both ordered by name.
    async fn list_categories(&self) -> Result<Vec<DrugCategory>, StorageError>;
    async fn add_category(&self, name: &str) -> Result<DrugCategory, StorageError>;
    /// Removes the category and every drug under it.
    async fn delete_category(&self, id: DrugCategoryId) -> Result<(), StorageError>;
    async fn add_drug(&self, category_id: DrugCategoryId, name: &str) -> Result<Drug, StorageError>;
    async fn delete_drug(&self, id: DrugId) -> Result<(), StorageError>;
    async fn is_listed(&self, drug_category: &str, drug: &str) -> Result<bool, StorageError>;
}

pub(crate) fn catalog_name<'a>(kind: &'static str, name: &'a str) -> Result<&'a str, StorageError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::EmptyCatalogName(kind));
    }
    Ok(name)
}
