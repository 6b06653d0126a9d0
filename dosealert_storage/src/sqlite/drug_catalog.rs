use std::collections::HashMap;

use async_trait::async_trait;
use dosealert_models::drug::{Drug, DrugCategory, DrugCategoryId, DrugId};
use sqlx::SqlitePool;

use crate::{DrugCatalog, StorageError, drug_catalog::catalog_name};

#[derive(sqlx::FromRow, Debug)]
struct DrugCategoryStorageModel {
    id: i64,
    name: String,
}

#[derive(sqlx::FromRow, Debug)]
struct DrugStorageModel {
    id: i64,
    drug_category_id: i64,
    name: String,
}

impl From<DrugStorageModel> for Drug {
    fn from(value: DrugStorageModel) -> Self {
        Drug {
            id: value.id,
            category_id: value.drug_category_id,
            name: value.name,
        }
    }
}

pub struct SqliteDrugCatalog {
    pool: SqlitePool,
}

impl SqliteDrugCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn drug_is_listed(
    pool: &SqlitePool,
    drug_category: &str,
    drug: &str,
) -> Result<bool, StorageError> {
    let listed: i64 = sqlx::query_scalar(
        "
SELECT EXISTS (
    SELECT 1 FROM drugs
    JOIN drug_categories ON drug_categories.id = drugs.drug_category_id
    WHERE drug_categories.name = ? AND drugs.name = ?
)
",
    )
    .bind(drug_category)
    .bind(drug)
    .fetch_one(pool)
    .await?;

    Ok(listed != 0)
}

#[async_trait]
impl DrugCatalog for SqliteDrugCatalog {
    async fn list_categories(&self) -> Result<Vec<DrugCategory>, StorageError> {
        let categories = sqlx::query_as::<_, DrugCategoryStorageModel>(
            "SELECT id, name FROM drug_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        let drugs = sqlx::query_as::<_, DrugStorageModel>(
            "SELECT id, drug_category_id, name FROM drugs ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut drugs_by_category: HashMap<DrugCategoryId, Vec<Drug>> = HashMap::new();
        for drug in drugs {
            drugs_by_category
                .entry(drug.drug_category_id)
                .or_default()
                .push(drug.into());
        }

        Ok(categories
            .into_iter()
            .map(|category| DrugCategory {
                drugs: drugs_by_category.remove(&category.id).unwrap_or_default(),
                id: category.id,
                name: category.name,
            })
            .collect())
    }

    async fn add_category(&self, name: &str) -> Result<DrugCategory, StorageError> {
        let name = catalog_name("drug category", name)?;

        let created = sqlx::query_as::<_, DrugCategoryStorageModel>(
            "INSERT INTO drug_categories (name) VALUES (?) ON CONFLICT (name) DO NOTHING RETURNING *",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::DuplicateCatalogEntry(name.to_owned()))?;

        log::info!("Added drug category {} '{}'", created.id, created.name);
        Ok(DrugCategory {
            id: created.id,
            name: created.name,
            drugs: Vec::new(),
        })
    }

    async fn delete_category(&self, id: DrugCategoryId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM drug_categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::CategoryNotFound(id));
        }

        log::info!("Deleted drug category {id} and its drugs");
        Ok(())
    }

    async fn add_drug(&self, category_id: DrugCategoryId, name: &str) -> Result<Drug, StorageError> {
        let name = catalog_name("drug", name)?;

        let created = sqlx::query_as::<_, DrugStorageModel>(
            "
INSERT INTO drugs (drug_category_id, name)
SELECT id, ? FROM drug_categories WHERE id = ?
ON CONFLICT (drug_category_id, name) DO NOTHING
RETURNING *
",
        )
        .bind(name)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(created) = created else {
            let category_exists: i64 =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM drug_categories WHERE id = ?)")
                    .bind(category_id)
                    .fetch_one(&self.pool)
                    .await?;

            return Err(if category_exists != 0 {
                StorageError::DuplicateCatalogEntry(name.to_owned())
            } else {
                StorageError::CategoryNotFound(category_id)
            });
        };

        log::info!("Added drug {} '{}' to category {category_id}", created.id, created.name);
        Ok(created.into())
    }

    async fn delete_drug(&self, id: DrugId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM drugs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::DrugNotFound(id));
        }

        log::info!("Deleted drug {id}");
        Ok(())
    }

    async fn is_listed(&self, drug_category: &str, drug: &str) -> Result<bool, StorageError> {
        drug_is_listed(&self.pool, drug_category.trim(), drug.trim()).await
    }
}
