//! Requirement skeletons and the optional columns attached to them.

use serde::{Deserialize, Deserializer, Serialize};

use super::{IdRef, Resource, Updatable, null_as_default};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSkeleton {
    pub id: Option<u64>,
    pub short_name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    pub universal_id: Option<String>,
    pub req_category: Option<IdRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_instances: Vec<IdRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collection_instances: Vec<IdRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_types: Vec<IdRef>,
}

impl RequirementSkeleton {
    pub fn new(
        short_name: impl Into<String>,
        description: impl Into<String>,
        requirement_category_id: u64,
    ) -> Self {
        Self {
            id: None,
            short_name: short_name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
            universal_id: None,
            req_category: Some(IdRef::new(requirement_category_id)),
            tag_instances: Vec::new(),
            collection_instances: Vec::new(),
            project_types: Vec::new(),
        }
    }

    pub fn has_any_project_type(&self, project_types: &[u64]) -> bool {
        self.project_types
            .iter()
            .any(|p| project_types.contains(&p.id))
    }
}

impl Resource for RequirementSkeleton {
    const PATH: &'static str = "requirementSkeletons";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSkeletonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_category: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_instances: Option<Vec<IdRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_instances: Option<Vec<IdRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_types: Option<Vec<IdRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universal_id: Option<String>,
}

impl Updatable for RequirementSkeleton {
    type Patch = RequirementSkeletonPatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptColumnType {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
}

impl OptColumnType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
        }
    }
}

impl Resource for OptColumnType {
    const PATH: &'static str = "optColumnTypes";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct OptColumnTypePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Updatable for OptColumnType {
    type Patch = OptColumnTypePatch;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptColumn {
    pub id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(default = "visible_by_default", deserialize_with = "null_as_visible")]
    pub is_visible_by_default: bool,
    pub opt_column_type: Option<IdRef>,
}

fn visible_by_default() -> bool {
    true
}

fn null_as_visible<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(visible_by_default))
}

impl OptColumn {
    pub fn new(name: impl Into<String>, description: impl Into<String>, opt_column_type_id: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            show_order: 0,
            active: false,
            is_visible_by_default: true,
            opt_column_type: Some(IdRef::new(opt_column_type_id)),
        }
    }
}

impl Resource for OptColumn {
    const PATH: &'static str = "optColumns";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptColumnPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_column_type: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible_by_default: Option<bool>,
}

impl Updatable for OptColumn {
    type Patch = OptColumnPatch;
}

/// Value of one optional column for one requirement skeleton.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptColumnContent {
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    pub opt_column: Option<IdRef>,
    pub requirement_skeleton: Option<IdRef>,
}

impl OptColumnContent {
    pub fn new(content: impl Into<String>, opt_column_id: u64, requirement_skeleton_id: u64) -> Self {
        Self {
            id: None,
            content: content.into(),
            opt_column: Some(IdRef::new(opt_column_id)),
            requirement_skeleton: Some(IdRef::new(requirement_skeleton_id)),
        }
    }
}

impl Resource for OptColumnContent {
    const PATH: &'static str = "optColumnContents";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptColumnContentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_column: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_skeleton: Option<IdRef>,
}

impl Updatable for OptColumnContent {
    type Patch = OptColumnContentPatch;
}
