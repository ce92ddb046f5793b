use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::items::{Behaviour, BehaviourAsset, ItemKind, ASSET_BEHAVIOUR, PORTAL_BEHAVIOUR};
use crate::portal::{Portal, PortalDirection, PortalToken};
use crate::property::Property;
use crate::resources::ResourceLookup;
use crate::{GraphError, Result};

/// Blueprint for a new behaviour: its type name and the portals stamped onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourTemplate {
    pub name: String,
    pub category: Option<String>,
    pub description: String,
    portals: Vec<Portal>,
}

impl BehaviourTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            description: String::new(),
            portals: Vec::new(),
        }
    }

    pub fn with_portal(mut self, direction: PortalDirection, property: Property) -> Self {
        self.portals.push(Portal::new(direction, property));
        self
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    /// Build the item kind for a new behaviour called `alias`. The `Asset` template
    /// yields an asset-bound behaviour; portal behaviours are not built from templates.
    pub fn instantiate(&self, alias: impl Into<String>) -> Result<ItemKind> {
        let mut behaviour = Behaviour::new(alias, self.name.clone());
        for portal in &self.portals {
            let len = behaviour.portals().len();
            behaviour.insert_portal(len, portal.clone())?;
        }

        match self.name.as_str() {
            ASSET_BEHAVIOUR => Ok(ItemKind::Asset(BehaviourAsset::new(behaviour))),
            PORTAL_BEHAVIOUR => Err(GraphError::invalid(
                "portal behaviours are created from a property, not a template",
            )),
            _ => Ok(ItemKind::Behaviour(behaviour)),
        }
    }
}

// JSON structures for loading templates
#[derive(Debug, Deserialize)]
struct TemplateFile {
    templates: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    portals: Vec<PortalToken>,
}

/// Templates by name. The built-in `Asset` and `Portal` templates are always present.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, BehaviourTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        let mut templates = BTreeMap::new();

        let asset = BehaviourTemplate::new(ASSET_BEHAVIOUR)
            .with_portal(PortalDirection::Parameter, Property::asset("Asset", None));
        templates.insert(asset.name.clone(), asset);

        let portal = BehaviourTemplate::new(PORTAL_BEHAVIOUR);
        templates.insert(portal.name.clone(), portal);

        Self { templates }
    }

    /// Parse `{ "templates": [...] }` on top of the built-ins. Portal properties
    /// must be in full token form.
    pub fn from_json_str(json: &str, lookup: &dyn ResourceLookup) -> Result<Self> {
        let file: TemplateFile = serde_json::from_str(json)?;
        let mut registry = Self::new();

        for entry in file.templates {
            let mut template = BehaviourTemplate::new(entry.name);
            template.category = entry.category;
            template.description = entry.description;
            for token in &entry.portals {
                template.portals.push(Portal::from_token(token, lookup)?);
            }
            registry.register(template)?;
        }

        debug!(templates = registry.len(), "Behaviour templates loaded");
        Ok(registry)
    }

    pub fn register(&mut self, template: BehaviourTemplate) -> Result<()> {
        if matches!(template.name.as_str(), ASSET_BEHAVIOUR | PORTAL_BEHAVIOUR) {
            return Err(GraphError::invalid(format!(
                "'{}' is a built-in template",
                template.name
            )));
        }
        if self.templates.contains_key(&template.name) {
            return Err(GraphError::invalid(format!(
                "template '{}' is already registered",
                template.name
            )));
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BehaviourTemplate> {
        self.templates.get(name)
    }

    /// Like [`TemplateRegistry::get`], but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<&BehaviourTemplate> {
        self.get(name)
            .ok_or_else(|| GraphError::invalid(format!("unknown behaviour template '{}'", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
