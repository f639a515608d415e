//! Collection, tag and requirement categories and their instances.

use serde::{Deserialize, Serialize};

use super::{IdRef, Resource, Updatable, null_as_default};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCategory {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl CollectionCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
        }
    }
}

impl Resource for CollectionCategory {
    const PATH: &'static str = "collectionCategorys";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

/// Patch shared by collection and tag categories.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Updatable for CollectionCategory {
    type Patch = CategoryPatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInstance {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    pub collection_category: Option<IdRef>,
}

impl CollectionInstance {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        collection_category_id: u64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
            collection_category: Some(IdRef::new(collection_category_id)),
        }
    }
}

impl Resource for CollectionInstance {
    const PATH: &'static str = "collectionInstances";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInstancePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_category: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Updatable for CollectionInstance {
    type Patch = CollectionInstancePatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TagCategory {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl TagCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
        }
    }
}

impl Resource for TagCategory {
    const PATH: &'static str = "tagCategorys";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Updatable for TagCategory {
    type Patch = CategoryPatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TagInstance {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    pub tag_category: Option<IdRef>,
}

impl TagInstance {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tag_category_id: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
            tag_category: Some(IdRef::new(tag_category_id)),
        }
    }
}

impl Resource for TagInstance {
    const PATH: &'static str = "tagInstances";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TagInstancePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_category: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Updatable for TagInstance {
    type Patch = TagInstancePatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequirementCategory {
    pub id: Option<u64>,
    pub name: String,
    /// Short name used as requirement id prefix.
    pub shortcut: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl RequirementCategory {
    pub fn new(
        name: impl Into<String>,
        shortcut: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            shortcut: Some(shortcut.into()),
            description: Some(description.into()),
            show_order: 0,
            active: false,
        }
    }
}

impl Resource for RequirementCategory {
    const PATH: &'static str = "reqCategorys";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequirementCategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Updatable for RequirementCategory {
    type Patch = RequirementCategoryPatch;
}
