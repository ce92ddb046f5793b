use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::property::{Property, PropertyToken};
use crate::resources::ResourceLookup;
use crate::{GraphError, Result};

/// Direction of a portal socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortalDirection {
    Input,
    Output,
    Parameter,
    Product,
}

impl PortalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortalDirection::Input => "input",
            PortalDirection::Output => "output",
            PortalDirection::Parameter => "parameter",
            PortalDirection::Product => "product",
        }
    }

    /// Links start at outputs and products.
    pub fn is_source(&self) -> bool {
        matches!(self, PortalDirection::Output | PortalDirection::Product)
    }

    /// Links end at inputs and parameters.
    pub fn is_sink(&self) -> bool {
        !self.is_source()
    }

    /// The socket a boundary item shows on the inside of a sub-graph.
    pub fn inverse(&self) -> Self {
        match self {
            PortalDirection::Input => PortalDirection::Output,
            PortalDirection::Output => PortalDirection::Input,
            PortalDirection::Parameter => PortalDirection::Product,
            PortalDirection::Product => PortalDirection::Parameter,
        }
    }
}

impl fmt::Display for PortalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed socket bound to one property
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub name: String,
    pub direction: PortalDirection,
    pub property: Property,
}

impl Portal {
    /// The portal takes its name from the property it exposes.
    pub fn new(direction: PortalDirection, property: Property) -> Self {
        Self {
            name: property.name.clone(),
            direction,
            property,
        }
    }

    pub fn tokenize(&self) -> PortalToken {
        PortalToken {
            name: self.name.clone(),
            direction: self.direction,
            property: self.property.tokenize(false),
        }
    }

    /// The token's name must match its property's, as for [`Portal::new`].
    pub fn from_token(token: &PortalToken, lookup: &dyn ResourceLookup) -> Result<Self> {
        if token.name != token.property.name {
            return Err(GraphError::invalid(format!(
                "portal '{}' exposes a property named '{}'",
                token.name, token.property.name
            )));
        }
        Ok(Self {
            name: token.name.clone(),
            direction: token.direction,
            property: Property::from_token(&token.property, lookup)?,
        })
    }
}

/// Persisted form of a [`Portal`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PortalToken {
    pub name: String,
    pub direction: PortalDirection,
    pub property: PropertyToken,
}
