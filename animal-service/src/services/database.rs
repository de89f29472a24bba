use crate::config::MongoConfig;
use crate::models::{Animal, Breed, PopulatedBreed};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, FindOptions},
    Client as MongoClient, Collection, Database,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::readiness::{ConnectionState, ReadinessSignal};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ANIMALS_COLLECTION: &str = "animals";
pub const BREEDS_COLLECTION: &str = "breeds";
const DEFAULT_DATABASE: &str = "animals";

/// Handle on the animal store. Cloning shares the driver's connection pool and
/// the readiness signal.
#[derive(Clone)]
pub struct AnimalDb {
    client: MongoClient,
    db: Database,
    readiness: ReadinessSignal,
}

impl AnimalDb {
    /// Build a client without waiting for the server. The readiness signal
    /// starts as `Connecting`; [`AnimalDb::spawn_monitor`] moves it forward.
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::ConfigError(e.into())
            })?;
        client_options.app_name = Some("animal-service".to_string());

        let database = config
            .database
            .clone()
            .or_else(|| client_options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = MongoClient::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(&database);
        tracing::info!(database = %database, "MongoDB client created, connecting in background");

        Ok(Self {
            client,
            db,
            readiness: ReadinessSignal::default(),
        })
    }

    pub fn readiness(&self) -> &ReadinessSignal {
        &self.readiness
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    /// Ping the server every `interval` and publish the result on the
    /// readiness signal. Each ping is bounded by the same interval.
    pub fn spawn_monitor(&self, interval: Duration) -> JoinHandle<()> {
        let db = self.clone();
        tokio::spawn(async move {
            loop {
                let state = match tokio::time::timeout(interval, db.health_check()).await {
                    Ok(Ok(())) => ConnectionState::Connected,
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "MongoDB ping failed");
                        ConnectionState::Disconnected
                    }
                    Err(_) => {
                        tracing::debug!(timeout = ?interval, "MongoDB ping timed out");
                        ConnectionState::Disconnected
                    }
                };

                if db.readiness.set(state) {
                    match state {
                        ConnectionState::Connected => tracing::info!("Connected to MongoDB"),
                        other => tracing::warn!(state = other.as_str(), "MongoDB unavailable"),
                    }
                }

                tokio::time::sleep(interval).await;
            }
        })
    }

    pub fn animals(&self) -> Collection<Animal> {
        self.db.collection(ANIMALS_COLLECTION)
    }

    pub fn breeds(&self) -> Collection<Breed> {
        self.db.collection(BREEDS_COLLECTION)
    }

    /// All animals in insertion order.
    pub async fn list_animals(&self) -> Result<Vec<Animal>, AppError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self.animals().find(None, Some(options)).await?;
        Ok(cursor.try_collect().await?)
    }

    /// First animal whose `name` matches exactly.
    pub async fn find_animal_by_name(&self, name: &str) -> Result<Option<Animal>, AppError> {
        Ok(self.animals().find_one(doc! { "name": name }, None).await?)
    }

    /// All breeds with `breed` resolved against the animals collection.
    pub async fn list_populated_breeds(&self) -> Result<Vec<PopulatedBreed>, AppError> {
        let pipeline = vec![
            doc! { "$sort": { "_id": 1 } },
            doc! {
                "$lookup": {
                    "from": ANIMALS_COLLECTION,
                    "localField": "breed",
                    "foreignField": "_id",
                    "as": "breed",
                }
            },
            doc! {
                "$unwind": {
                    "path": "$breed",
                    "preserveNullAndEmptyArrays": true,
                }
            },
        ];

        let cursor = self.breeds().aggregate(pipeline, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        documents
            .into_iter()
            .map(|document| {
                mongodb::bson::from_document(document).map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Malformed breed document: {}", e))
                })
            })
            .collect()
    }
}
