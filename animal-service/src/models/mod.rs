use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub age: i32,
    pub is_furry: bool,
}

impl Animal {
    pub fn new(name: impl Into<String>, age: i32, is_furry: bool) -> Self {
        Self {
            id: Some(ObjectId::new()),
            name: name.into(),
            age,
            is_furry,
        }
    }
}

/// Stored form of a breed. `breed` references an [`Animal`] by id.
///
/// The field names an animal rather than a breed descriptor; this mirrors the
/// data the service has always published and is kept as-is.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Breed {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub breed: Option<ObjectId>,
}

/// A [`Breed`] with its `breed` reference resolved to the full animal document.
/// `breed` is `None` when the reference dangles.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PopulatedBreed {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub breed: Option<Animal>,
}
