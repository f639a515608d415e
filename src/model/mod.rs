//! Typed SecurityRAT entities.
//!
//! Every entity maps to one REST collection. Relations are sent and received
//! as `{ "id": n }` references; the server may return the full related object,
//! of which only the id is kept.

mod catalog;
mod project;
mod requirement;

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

pub use catalog::{
    CollectionCategory, CategoryPatch, CollectionInstance, CollectionInstancePatch,
    RequirementCategory, RequirementCategoryPatch, TagCategory, TagInstance, TagInstancePatch,
};
pub use project::{
    AlternativeInstance, AlternativeSet, ProjectType, ProjectTypePatch, StatusColumn,
    StatusColumnValue,
};
pub use requirement::{
    OptColumn, OptColumnContent, OptColumnContentPatch, OptColumnPatch, OptColumnType,
    OptColumnTypePatch, RequirementSkeleton, RequirementSkeletonPatch,
};

/// Reference to a related entity by id.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRef {
    pub id: u64,
}

impl IdRef {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn many(ids: &[u64]) -> Vec<IdRef> {
        ids.iter().copied().map(IdRef::new).collect()
    }
}

/// An entity stored in one REST collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection endpoint relative to the API base URL, e.g. `tagInstances`.
    const PATH: &'static str;

    fn id(&self) -> Option<u64>;
}

/// An entity that supports partial updates.
pub trait Updatable: Resource {
    /// Fields to change; fields left `None` are kept as the server has them.
    type Patch: Serialize + Send + Sync;
}

/// Reads an explicit `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Copies every non-null top-level field of `patch` onto `target`.
pub fn overlay(target: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            if !value.is_null() {
                target.insert(key, value);
            }
        }
    }
}
