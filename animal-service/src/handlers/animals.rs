//! Read-only animal endpoints.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{AnimalResponse, BreedResponse},
    startup::AppState,
};

fn invalid_name() -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Invalid animal name"))
}

/// `GET /`
pub async fn list_animals(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnimalResponse>>, AppError> {
    let animals = state.db.list_animals().await?;
    tracing::debug!(count = animals.len(), "Listing animals");

    Ok(Json(animals.into_iter().map(AnimalResponse::from).collect()))
}

/// `GET /:name`
pub async fn get_animal(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Json<AnimalResponse>, AppError> {
    // Any decodable name goes to the lookup; only a path that cannot be
    // decoded into a string is rejected.
    let Path(name) = name.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Undecodable animal name");
        invalid_name()
    })?;

    let animal = state
        .db
        .find_animal_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Animal not found")))?;

    Ok(Json(AnimalResponse::from(animal)))
}

/// `GET /animals/cats`, registered only when breeds are enabled.
pub async fn list_cats(
    State(state): State<AppState>,
) -> Result<Json<Vec<BreedResponse>>, AppError> {
    let breeds = state.db.list_populated_breeds().await?;
    tracing::debug!(count = breeds.len(), "Listing breeds");

    Ok(Json(breeds.into_iter().map(BreedResponse::from).collect()))
}
