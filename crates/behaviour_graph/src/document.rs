//! On-disk graph document: metadata plus the item token sequence.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resources::ResourceLookup;
use crate::schema::ContainerSchema;
use crate::tokens::ItemToken;
use crate::Result;

pub const DOCUMENT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphMetadata {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl GraphMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            version: DOCUMENT_VERSION.to_string(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphDocument {
    pub metadata: GraphMetadata,
    #[serde(default)]
    pub items: Vec<ItemToken>,
}

impl GraphDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: GraphMetadata::new(name),
            items: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Snapshot a schema under the given metadata.
    pub fn capture(metadata: GraphMetadata, schema: &ContainerSchema) -> Result<Self> {
        Ok(Self {
            metadata,
            items: schema.serialize()?,
        })
    }

    pub fn to_schema(&self, lookup: &dyn ResourceLookup) -> Result<ContainerSchema> {
        ContainerSchema::from_tokens(&self.items, lookup)
    }

    /// JSON Schema describing the document format.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(GraphDocument)).unwrap_or_default()
    }
}
