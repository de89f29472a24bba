use serde::Serialize;

use crate::models::{Animal, PopulatedBreed};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AnimalResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub age: i32,
    #[serde(rename = "isFurry")]
    pub is_furry: bool,
}

impl From<Animal> for AnimalResponse {
    fn from(animal: Animal) -> Self {
        Self {
            id: animal.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: animal.name,
            age: animal.age,
            is_furry: animal.is_furry,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BreedResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub breed: Option<AnimalResponse>,
}

impl From<PopulatedBreed> for BreedResponse {
    fn from(breed: PopulatedBreed) -> Self {
        Self {
            id: breed.id.to_hex(),
            breed: breed.breed.map(AnimalResponse::from),
        }
    }
}
