//! Project types, status columns and requirement alternatives.

use serde::{Deserialize, Serialize};

use super::{IdRef, Resource, Updatable, null_as_default};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectType {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_columns: Vec<IdRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub opt_columns: Vec<IdRef>,
}

impl ProjectType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
            status_columns: Vec::new(),
            opt_columns: Vec::new(),
        }
    }
}

impl Resource for ProjectType {
    const PATH: &'static str = "projectTypes";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTypePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_columns: Option<Vec<IdRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_columns: Option<Vec<IdRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Updatable for ProjectType {
    type Patch = ProjectTypePatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusColumn {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    /// Whether values are picked from a fixed set of status column values.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_enum: bool,
}

impl StatusColumn {
    pub fn new(name: impl Into<String>, description: impl Into<String>, is_enum: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: true,
            is_enum,
        }
    }
}

impl Resource for StatusColumn {
    const PATH: &'static str = "statusColumns";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusColumnValue {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    pub status_column: Option<IdRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl StatusColumnValue {
    pub fn new(name: impl Into<String>, description: impl Into<String>, status_column_id: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            status_column: Some(IdRef::new(status_column_id)),
            show_order: 0,
            active: true,
        }
    }
}

impl Resource for StatusColumnValue {
    const PATH: &'static str = "statusColumnValues";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeSet {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    pub opt_column: Option<IdRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl AlternativeSet {
    pub fn new(name: impl Into<String>, description: impl Into<String>, opt_column_id: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            opt_column: Some(IdRef::new(opt_column_id)),
            show_order: 0,
            active: true,
        }
    }
}

impl Resource for AlternativeSet {
    const PATH: &'static str = "alternativeSets";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeInstance {
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    pub alternative_set: Option<IdRef>,
    pub requirement_skeleton: Option<IdRef>,
}

impl AlternativeInstance {
    pub fn new(content: impl Into<String>, alternative_set_id: u64, requirement_skeleton_id: u64) -> Self {
        Self {
            id: None,
            content: content.into(),
            alternative_set: Some(IdRef::new(alternative_set_id)),
            requirement_skeleton: Some(IdRef::new(requirement_skeleton_id)),
        }
    }
}

impl Resource for AlternativeInstance {
    const PATH: &'static str = "alternativeInstances";

    fn id(&self) -> Option<u64> {
        self.id
    }
}
