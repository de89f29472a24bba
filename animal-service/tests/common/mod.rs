use animal_service::config::{AnimalConfig, MongoConfig};
use animal_service::services::AnimalDb;
use animal_service::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: AnimalDb,
}

impl TestApp {
    /// Spawn the service against `TEST_MONGODB_URI` with a throwaway database and
    /// wait until the seed data is visible.
    pub async fn spawn(breeds_enabled: bool) -> Self {
        let config = AnimalConfig {
            common: CoreConfig {
                port: 0, // Random port
                log_level: "info".to_string(),
                otel_exporter_otlp_endpoint: None,
            },
            mongodb: MongoConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                database: Some(format!("animal_test_{}", mongodb::bson::oid::ObjectId::new())),
                probe_interval: Duration::from_millis(200),
            },
            breeds_enabled,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the seed task: it only runs once the database is connected.
        let client = reqwest::Client::new();
        for _ in 0..100 {
            if let Ok(response) = client.get(format!("{}/", address)).send().await {
                if response.status().is_success() {
                    let animals: Vec<serde_json::Value> =
                        response.json().await.unwrap_or_default();
                    if animals.len() == 3
                        && (!breeds_enabled || breeds_seeded(&client, &address).await)
                    {
                        break;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp { address, port, db }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .database()
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}

async fn breeds_seeded(client: &reqwest::Client, address: &str) -> bool {
    match client.get(format!("{}/animals/cats", address)).send().await {
        Ok(response) if response.status().is_success() => response
            .json::<Vec<serde_json::Value>>()
            .await
            .map(|cats| cats.len() == 1)
            .unwrap_or(false),
        _ => false,
    }
}
