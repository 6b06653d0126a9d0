use serde::{Deserialize, Serialize};

pub type DrugCategoryId = i64;
pub type DrugId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drug {
    pub id: DrugId,
    pub category_id: DrugCategoryId,
    pub name: String,
}

/// A category in the pharmacy's drug catalog together with the drugs filed
/// under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugCategory {
    pub id: DrugCategoryId,
    pub name: String,
    pub drugs: Vec<Drug>,
}

impl DrugCategory {
    pub fn drug_names(&self) -> impl Iterator<Item = &str> {
        self.drugs.iter().map(|drug| drug.name.as_str())
    }
}
