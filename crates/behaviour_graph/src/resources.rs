//! Resource lookup used when de-tokenizing asset and group references.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ResourceId;

/// Class name that group resources report.
pub const GROUP_CLASS: &str = "group";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: ResourceId,
    pub name: String,
    #[serde(rename = "className")]
    pub class_name: String,
}

/// Resolves a resource reference by its shallow identity.
pub trait ResourceLookup {
    fn resolve(&self, id: ResourceId) -> Option<ResourceInfo>;
}

/// Lookup that knows no resources; every reference resolves to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceLookup for NoResources {
    fn resolve(&self, _id: ResourceId) -> Option<ResourceInfo> {
        None
    }
}

/// In-memory resource catalog.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: HashMap<ResourceId, ResourceInfo>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u64, name: impl Into<String>, class_name: impl Into<String>) {
        let id = ResourceId(id);
        self.resources.insert(
            id,
            ResourceInfo {
                id,
                name: name.into(),
                class_name: class_name.into(),
            },
        );
    }

    /// Builder-style variant of [`ResourceCatalog::insert`].
    pub fn with(mut self, id: u64, name: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.insert(id, name, class_name);
        self
    }

    /// Parse a catalog from a JSON array of resource entries.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let entries: Vec<ResourceInfo> = serde_json::from_str(json)?;
        Ok(Self {
            resources: entries.into_iter().map(|info| (info.id, info)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLookup for ResourceCatalog {
    fn resolve(&self, id: ResourceId) -> Option<ResourceInfo> {
        self.resources.get(&id).cloned()
    }
}
