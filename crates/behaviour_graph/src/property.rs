//! Typed property cells and their token form.
//!
//! A [`Property`] is a named value whose [`PropertyKind`] is fixed when it is
//! built. Values only change through [`Property::set_value`] or
//! [`Property::detokenize`], both of which refuse a value of another kind.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use tracing::warn;

use crate::errors::check_finite;
use crate::resources::{ResourceLookup, GROUP_CLASS};
use crate::{GraphError, ResourceId, Result};

/// Kind of value a property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyKind {
    Bool,
    Number,
    Text,
    Enum,
    Asset,
    File,
    Group,
    AssetList,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Number => "number",
            PropertyKind::Text => "text",
            PropertyKind::Enum => "enum",
            PropertyKind::Asset => "asset",
            PropertyKind::File => "file",
            PropertyKind::Group => "group",
            PropertyKind::AssetList => "asset-list",
        }
    }

    /// Kinds whose values are resolved through a [`ResourceLookup`].
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            PropertyKind::Asset | PropertyKind::Group | PropertyKind::AssetList
        )
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value. The variant is the value's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Enum(String),
    Asset(Option<ResourceId>),
    File(Option<String>),
    Group(Option<ResourceId>),
    AssetList(Vec<ResourceId>),
}

impl Value {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Value::Bool(_) => PropertyKind::Bool,
            Value::Number(_) => PropertyKind::Number,
            Value::Text(_) => PropertyKind::Text,
            Value::Enum(_) => PropertyKind::Enum,
            Value::Asset(_) => PropertyKind::Asset,
            Value::File(_) => PropertyKind::File,
            Value::Group(_) => PropertyKind::Group,
            Value::AssetList(_) => PropertyKind::AssetList,
        }
    }

    /// The empty value of a kind.
    pub fn default_for(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Bool => Value::Bool(false),
            PropertyKind::Number => Value::Number(0.0),
            PropertyKind::Text => Value::Text(String::new()),
            PropertyKind::Enum => Value::Enum(String::new()),
            PropertyKind::Asset => Value::Asset(None),
            PropertyKind::File => Value::File(None),
            PropertyKind::Group => Value::Group(None),
            PropertyKind::AssetList => Value::AssetList(Vec::new()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(value) => json!(value),
            Value::Number(value) => json!(value),
            Value::Text(value) | Value::Enum(value) => json!(value),
            Value::Asset(id) | Value::Group(id) => json!(id.map(|id| id.0)),
            Value::File(path) => json!(path),
            Value::AssetList(ids) => json!(ids.iter().map(|id| id.0).collect::<Vec<_>>()),
        }
    }

    /// Decode a JSON value as a value of `kind`. `name` only feeds the error message.
    pub fn from_json(kind: PropertyKind, name: &str, json: &serde_json::Value) -> Result<Self> {
        let mismatch = || GraphError::mismatch(name, kind, describe_json(json));

        let value = match kind {
            PropertyKind::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
            PropertyKind::Number => Value::Number(json.as_f64().ok_or_else(mismatch)?),
            PropertyKind::Text => Value::Text(json.as_str().ok_or_else(mismatch)?.to_string()),
            PropertyKind::Enum => Value::Enum(json.as_str().ok_or_else(mismatch)?.to_string()),
            PropertyKind::Asset | PropertyKind::Group => {
                let id = if json.is_null() {
                    None
                } else {
                    Some(ResourceId(json.as_u64().ok_or_else(mismatch)?))
                };
                if kind == PropertyKind::Asset {
                    Value::Asset(id)
                } else {
                    Value::Group(id)
                }
            }
            PropertyKind::File => {
                if json.is_null() {
                    Value::File(None)
                } else {
                    Value::File(Some(json.as_str().ok_or_else(mismatch)?.to_string()))
                }
            }
            PropertyKind::AssetList => {
                if json.is_null() {
                    Value::AssetList(Vec::new())
                } else {
                    let ids = json
                        .as_array()
                        .ok_or_else(mismatch)?
                        .iter()
                        .map(|entry| entry.as_u64().map(ResourceId).ok_or_else(mismatch))
                        .collect::<Result<Vec<_>>>()?;
                    Value::AssetList(ids)
                }
            }
        };

        Ok(value)
    }
}

fn describe_json(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Allowed range for number properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NumberRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default = "default_interval")]
    pub interval: f64,
}

fn default_interval() -> f64 {
    1.0
}

impl NumberRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            decimals: 0,
            interval: 1.0,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A typed, named value cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub category: Option<String>,
    /// Free-form editor hints carried through tokenization untouched.
    pub options: Option<serde_json::Value>,
    value: Value,
    range: Option<NumberRange>,
    choices: Vec<String>,
    extensions: Vec<String>,
    class_names: Vec<String>,
}

impl Property {
    fn with_value(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            category: None,
            options: None,
            value,
            range: None,
            choices: Vec::new(),
            extensions: Vec::new(),
            class_names: Vec::new(),
        }
    }

    pub fn empty(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self::with_value(name, Value::default_for(kind))
    }

    pub fn bool(name: impl Into<String>, value: bool) -> Self {
        Self::with_value(name, Value::Bool(value))
    }

    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self::with_value(name, Value::Number(value))
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_value(name, Value::Text(value.into()))
    }

    pub fn enumeration(
        name: impl Into<String>,
        value: impl Into<String>,
        choices: Vec<String>,
    ) -> Self {
        let mut property = Self::with_value(name, Value::Enum(value.into()));
        property.choices = choices;
        property
    }

    pub fn asset(name: impl Into<String>, value: Option<ResourceId>) -> Self {
        Self::with_value(name, Value::Asset(value))
    }

    pub fn file(name: impl Into<String>, value: Option<String>, extensions: Vec<String>) -> Self {
        let mut property = Self::with_value(name, Value::File(value));
        property.extensions = extensions;
        property
    }

    pub fn group(name: impl Into<String>, value: Option<ResourceId>) -> Self {
        Self::with_value(name, Value::Group(value))
    }

    pub fn asset_list(name: impl Into<String>, value: Vec<ResourceId>) -> Self {
        Self::with_value(name, Value::AssetList(value))
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_range(mut self, range: NumberRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Restrict asset and asset-list references to resources of these classes.
    pub fn with_class_names(mut self, class_names: Vec<String>) -> Self {
        self.class_names = class_names;
        self
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn range(&self) -> Option<&NumberRange> {
        self.range.as_ref()
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Asset reference held by an asset property, if any.
    pub fn asset_value(&self) -> Option<ResourceId> {
        match self.value {
            Value::Asset(id) => id,
            _ => None,
        }
    }

    /// Replace the value. The new value must be of this property's kind and satisfy
    /// its range or choices.
    pub fn set_value(&mut self, value: Value) -> Result<()> {
        self.check_value(&value)?;
        self.value = value;
        Ok(())
    }

    fn check_value(&self, value: &Value) -> Result<()> {
        if value.kind() != self.kind() {
            return Err(GraphError::mismatch(&self.name, self.kind(), value.kind()));
        }

        match value {
            Value::Number(number) => {
                check_finite(&self.name, *number)?;
                if let Some(range) = &self.range {
                    if !range.contains(*number) {
                        return Err(GraphError::invalid(format!(
                            "{} is outside [{}, {}] for '{}'",
                            number, range.min, range.max, self.name
                        )));
                    }
                }
            }
            Value::Enum(choice) => {
                if !self.choices.is_empty() && !self.choices.contains(choice) {
                    return Err(GraphError::invalid(format!(
                        "'{}' is not a choice of '{}'",
                        choice, self.name
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Every number this property would write out is finite.
    pub(crate) fn check_finite(&self) -> Result<()> {
        if let Value::Number(number) = &self.value {
            check_finite(&self.name, *number)?;
        }
        if let Some(range) = &self.range {
            for bound in [range.min, range.max, range.interval] {
                check_finite(&format!("range of '{}'", self.name), bound)?;
            }
        }
        Ok(())
    }

    fn accepts_class(&self, class_name: &str) -> bool {
        match self.kind() {
            PropertyKind::Group => class_name == GROUP_CLASS,
            _ => self.class_names.is_empty() || self.class_names.iter().any(|c| c == class_name),
        }
    }

    /// Produce the token form. A slim token carries only name and value; a full token
    /// also carries the kind tag and kind-specific metadata needed to rebuild the property.
    pub fn tokenize(&self, slim: bool) -> PropertyToken {
        if slim {
            return PropertyToken {
                name: self.name.clone(),
                value: self.value.to_json(),
                ..PropertyToken::default()
            };
        }

        PropertyToken {
            name: self.name.clone(),
            value: self.value.to_json(),
            kind: Some(self.kind()),
            category: self.category.clone(),
            options: self.options.clone(),
            range: self.range,
            choices: self.choices.clone(),
            extensions: self.extensions.clone(),
            class_names: self.class_names.clone(),
        }
    }

    /// Restore the value (and for full tokens, the metadata) from a token.
    /// Nothing is changed when this fails.
    pub fn detokenize(&mut self, token: &PropertyToken, lookup: &dyn ResourceLookup) -> Result<()> {
        if let Some(kind) = token.kind {
            if kind != self.kind() {
                return Err(GraphError::mismatch(&self.name, self.kind(), kind));
            }
        }

        let mut restored = self.clone();
        if token.kind.is_some() {
            restored.category = token.category.clone();
            restored.options = token.options.clone();
            restored.range = token.range;
            restored.choices = token.choices.clone();
            restored.extensions = token.extensions.clone();
            restored.class_names = token.class_names.clone();
        }

        let value = Value::from_json(self.kind(), &self.name, &token.value)?;
        let value = restored.resolve_references(value, lookup)?;
        restored.check_value(&value)?;
        restored.value = value;

        *self = restored;
        Ok(())
    }

    /// Build a property from a full token.
    pub fn from_token(token: &PropertyToken, lookup: &dyn ResourceLookup) -> Result<Self> {
        let kind = token.kind.ok_or_else(|| {
            GraphError::invalid(format!("property token '{}' has no type tag", token.name))
        })?;
        let mut property = Self::empty(token.name.clone(), kind);
        property.detokenize(token, lookup)?;
        Ok(property)
    }

    fn resolve_references(&self, value: Value, lookup: &dyn ResourceLookup) -> Result<Value> {
        let value = match value {
            Value::Asset(Some(id)) => Value::Asset(self.resolve_reference(id, lookup)?),
            Value::Group(Some(id)) => Value::Group(self.resolve_reference(id, lookup)?),
            Value::AssetList(ids) => {
                let mut resolved = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(id) = self.resolve_reference(id, lookup)? {
                        resolved.push(id);
                    }
                }
                Value::AssetList(resolved)
            }
            other => other,
        };
        Ok(value)
    }

    fn resolve_reference(
        &self,
        id: ResourceId,
        lookup: &dyn ResourceLookup,
    ) -> Result<Option<ResourceId>> {
        match lookup.resolve(id) {
            None => {
                warn!(property = %self.name, resource = id.0, "Unresolved resource reference cleared");
                Ok(None)
            }
            Some(info) if !self.accepts_class(&info.class_name) => Err(GraphError::mismatch(
                &self.name,
                self.kind(),
                format!("resource class '{}'", info.class_name),
            )),
            Some(_) => Ok(Some(id)),
        }
    }
}

/// Persisted form of a [`Property`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PropertyToken {
    pub name: String,
    pub value: serde_json::Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumberRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(rename = "classNames", default, skip_serializing_if = "Vec::is_empty")]
    pub class_names: Vec<String>,
}

impl PropertyToken {
    pub fn is_slim(&self) -> bool {
        self.kind.is_none()
    }
}
