pub mod domain;
pub mod hydration;
pub mod memory;
pub mod metrics;
pub mod observer;
pub mod persistence;
pub mod ports;
pub mod store;
pub mod version;

pub use domain::{
    DiabetesType, DomainError, Gender, GiLevel, Ingredient, MealPlan, MealType, Nutrition, Recipe,
    SavedRecipes, UserProfile,
};
pub use memory::InMemoryStorage;
pub use metrics::{HealthMetrics, PlanNutrition};
pub use observer::{NullObserver, RecordingObserver};
pub use persistence::{PersistenceAdapter, StorageKeys, WriteOutcome};
pub use ports::{KeyValueStorage, PersistenceEvent, PersistenceObserver, StorageError, StorageResult};
pub use store::{DomainStore, MutationOutcome, SaveToggle, Snapshot};
pub use version::CURRENT_SCHEMA_VERSION;
