pub mod database;
pub mod metrics;
pub mod seed;

pub use database::AnimalDb;
pub use self::metrics::{get_metrics, init_metrics};
