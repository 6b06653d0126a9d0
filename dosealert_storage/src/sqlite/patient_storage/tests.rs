use dosealert_models::{
    chrono::NaiveDate,
    patient::{NewPatient, PatientValidationError, Sex},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use super::*;
use crate::{
    DrugCatalog,
    sqlite::{MIGRATOR, SqliteDrugCatalog},
};

async fn storage() -> SqlitePatientStorage {
    let pool = pool().await;
    let catalog = SqliteDrugCatalog::new(pool.clone());
    let category = catalog.add_category("Antihypertensives").await.unwrap();
    catalog.add_drug(category.id, "Amlodipine").await.unwrap();

    SqlitePatientStorage::new(pool)
}

async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_patient(firstname: &str, lastname: &str, purchase_date: NaiveDate, days: i64) -> NewPatient {
    NewPatient {
        firstname: firstname.to_owned(),
        lastname: lastname.to_owned(),
        email: format!("{}.{}@example.com", firstname.to_lowercase(), lastname.to_lowercase()),
        phone_number: "+254700000001".to_owned(),
        sex: Sex::Female,
        drug_category: "Antihypertensives".to_owned(),
        drug: "Amlodipine".to_owned(),
        purchase_date,
        days_until_next_dose: days,
    }
}

#[tokio::test]
async fn insert_persists_reminder_dates() {
    let storage = storage().await;

    let patient = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();

    assert_eq!(patient.next_dose_date, date(2024, 6, 4));
    assert_eq!(
        patient.reminder_dates.to_strings(),
        vec!["2024-06-01", "2024-06-03", "2024-06-04"]
    );

    let stored = storage.get(patient.id).await.unwrap().unwrap();
    assert_eq!(stored, patient);
}

#[tokio::test]
async fn update_recomputes_reminder_dates() {
    let storage = storage().await;
    let patient = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();

    let updated = storage
        .update(patient.id, new_patient("Mary", "Wanjiru", date(2024, 5, 25), 30))
        .await
        .unwrap();

    assert_eq!(updated.next_dose_date, date(2024, 6, 24));
    assert_eq!(
        updated.reminder_dates.to_strings(),
        vec!["2024-06-21", "2024-06-23", "2024-06-24"]
    );
}

#[tokio::test]
async fn update_of_unknown_patient_is_not_found() {
    let storage = storage().await;

    let result = storage
        .update(42, new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await;

    assert!(matches!(result, Err(StorageError::NotFound(42))));
}

#[tokio::test]
async fn invalid_patient_is_not_stored() {
    let storage = storage().await;

    let result = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 0))
        .await;

    assert!(matches!(
        result,
        Err(StorageError::InvalidPatient(
            PatientValidationError::NonPositiveInterval(0)
        ))
    ));
    assert!(storage.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn drug_must_be_listed_under_its_category() {
    let storage = storage().await;
    let mut unlisted = new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10);
    unlisted.drug = "Metformin".to_owned();
    let mut wrong_category = new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10);
    wrong_category.drug_category = "Antibiotics".to_owned();

    assert!(matches!(
        storage.insert(unlisted.clone()).await,
        Err(StorageError::UnlistedDrug { drug, .. }) if drug == "Metformin"
    ));
    assert!(matches!(
        storage.insert(wrong_category).await,
        Err(StorageError::UnlistedDrug { drug_category, .. }) if drug_category == "Antibiotics"
    ));
    assert!(storage.list_active().await.unwrap().is_empty());

    let listed = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();
    assert!(matches!(
        storage.update(listed.id, unlisted).await,
        Err(StorageError::UnlistedDrug { .. })
    ));
    assert_eq!(storage.get(listed.id).await.unwrap().unwrap().drug, "Amlodipine");
}

#[tokio::test]
async fn soft_delete_moves_patient_to_trash_bin_and_restore_brings_it_back() {
    let storage = storage().await;
    let kept = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();
    let trashed = storage
        .insert(new_patient("John", "Otieno", date(2024, 5, 25), 10))
        .await
        .unwrap();

    let deleted = storage.soft_delete(trashed.id).await.unwrap();
    assert!(deleted.is_deleted());

    let active: Vec<_> = storage.list_active().await.unwrap().into_iter().map(|p| p.id).collect();
    let bin: Vec<_> = storage.list_deleted().await.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(active, vec![kept.id]);
    assert_eq!(bin, vec![trashed.id]);

    let restored = storage.restore(trashed.id).await.unwrap();
    assert!(!restored.is_deleted());
    assert_eq!(storage.list_active().await.unwrap().len(), 2);
    assert!(storage.list_deleted().await.unwrap().is_empty());
}

#[tokio::test]
async fn soft_delete_of_unknown_patient_is_not_found() {
    let storage = storage().await;

    assert!(matches!(
        storage.soft_delete(7).await,
        Err(StorageError::NotFound(7))
    ));
    assert!(matches!(
        storage.restore(7).await,
        Err(StorageError::NotFound(7))
    ));
}

#[tokio::test]
async fn reminder_query_matches_on_set_membership() {
    let storage = storage().await;
    // reminder dates 2024-06-01, 2024-06-03, 2024-06-04
    let due = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();
    // reminder dates 2024-06-02, 2024-06-04, 2024-06-05
    let also_due_later = storage
        .insert(new_patient("John", "Otieno", date(2024, 5, 26), 10))
        .await
        .unwrap();

    let on_third: Vec<_> = storage
        .find_patients_with_reminder_on(date(2024, 6, 3))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(on_third, vec![due.id]);

    let on_fourth: Vec<_> = storage
        .find_patients_with_reminder_on(date(2024, 6, 4))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(on_fourth, vec![due.id, also_due_later.id]);

    assert!(
        storage
            .find_patients_with_reminder_on(date(2024, 6, 10))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn reminder_query_skips_trashed_patients() {
    let storage = storage().await;
    let patient = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();
    storage.soft_delete(patient.id).await.unwrap();

    let matched = storage
        .find_patients_with_reminder_on(date(2024, 6, 3))
        .await
        .unwrap();

    assert!(matched.is_empty());
}

#[tokio::test]
async fn search_by_full_name_email_and_phone() {
    let storage = storage().await;
    let mary = storage
        .insert(new_patient("Mary", "Wanjiru", date(2024, 5, 25), 10))
        .await
        .unwrap();
    let mut john_details = new_patient("John", "Otieno", date(2024, 5, 25), 10);
    john_details.phone_number = "0711222333".to_owned();
    let john = storage.insert(john_details).await.unwrap();

    let by_name = storage
        .search(&PatientQuery::parse("mary wanj").unwrap())
        .await
        .unwrap();
    assert_eq!(by_name.iter().map(|p| p.id).collect::<Vec<_>>(), vec![mary.id]);

    let by_email = storage
        .search(&PatientQuery::parse("john.otieno@").unwrap())
        .await
        .unwrap();
    assert_eq!(by_email.iter().map(|p| p.id).collect::<Vec<_>>(), vec![john.id]);

    let by_phone = storage
        .search(&PatientQuery::parse("0711").unwrap())
        .await
        .unwrap();
    assert_eq!(by_phone.iter().map(|p| p.id).collect::<Vec<_>>(), vec![john.id]);

    let by_any = storage
        .search(&PatientQuery::parse("otie").unwrap())
        .await
        .unwrap();
    assert_eq!(by_any.iter().map(|p| p.id).collect::<Vec<_>>(), vec![john.id]);
}

#[tokio::test]
async fn search_treats_wildcards_literally_and_caps_results() {
    let storage = storage().await;
    for i in 0..12 {
        storage
            .insert(new_patient(&format!("Anna{i}"), "Njeri", date(2024, 5, 25), 10))
            .await
            .unwrap();
    }

    let capped = storage
        .search(&PatientQuery::parse("anna").unwrap())
        .await
        .unwrap();
    assert_eq!(capped.len(), SEARCH_RESULT_LIMIT as usize);

    let wildcard = storage
        .search(&PatientQuery::parse("%").unwrap())
        .await
        .unwrap();
    assert!(wildcard.is_empty(), "'%' must not match every patient");
}
