//! Startup seeding of the animal store.
//!
//! Each run deletes the collections and inserts the fixed dataset, so the
//! collection sizes after any number of runs equal those after one. The writes
//! are not transactional; a failure midway leaves whatever was written so far.

use crate::models::{Animal, Breed};
use crate::services::database::AnimalDb;
use crate::services::metrics::{record_seed_failure, record_seeded};
use mongodb::bson::doc;
use service_core::error::AppError;
use tokio::task::JoinHandle;

pub const SIXTEN: &str = "Sixten";

/// The fixed animal dataset, with fresh ids.
pub fn seed_animals() -> Vec<Animal> {
    vec![
        Animal::new(SIXTEN, 0, true),
        Animal::new("Alfons", 3, true),
        Animal::new("Goldy the goldfish", 1, false),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub animals: usize,
    pub breeds: usize,
}

/// Replace the collections' contents with the fixed dataset.
pub async fn run(db: &AnimalDb, breeds_enabled: bool) -> Result<SeedReport, AppError> {
    let animals = seed_animals();
    let sixten_id = animals
        .iter()
        .find(|animal| animal.name == SIXTEN)
        .and_then(|animal| animal.id);

    let deleted = db.animals().delete_many(doc! {}, None).await?;
    tracing::debug!(deleted = deleted.deleted_count, "Cleared animals");

    let inserted = db.animals().insert_many(animals, None).await?;
    let mut report = SeedReport {
        animals: inserted.inserted_ids.len(),
        breeds: 0,
    };
    record_seeded("animals", report.animals);

    if breeds_enabled {
        let deleted = db.breeds().delete_many(doc! {}, None).await?;
        tracing::debug!(deleted = deleted.deleted_count, "Cleared breeds");

        // The breed points at the Sixten animal record, not at a breed name.
        db.breeds()
            .insert_one(
                Breed {
                    id: None,
                    breed: sixten_id,
                },
                None,
            )
            .await?;
        report.breeds = 1;
        record_seeded("breeds", report.breeds);
    }

    Ok(report)
}

/// Seed once the database is reachable. Failures are logged and counted; the
/// service keeps serving whatever state the collections are in.
pub fn spawn(db: AnimalDb, breeds_enabled: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        db.readiness().wait_until_ready().await;

        match run(&db, breeds_enabled).await {
            Ok(report) => tracing::info!(
                animals = report.animals,
                breeds = report.breeds,
                "Seed data loaded"
            ),
            Err(e) => {
                record_seed_failure();
                tracing::error!(error = %e, "Failed to load seed data");
            }
        }
    })
}
