//! Canvas items: behaviours, comments and links.
//!
//! Every item carries an id, a canvas position and a selection flag. What the
//! item *is* lives in [`ItemKind`], and all per-kind behaviour (serialize,
//! duplicate, link resolution) dispatches on it.

use std::collections::HashMap;
use tracing::trace;

use crate::ids::{IdAllocator, ShallowId};
use crate::portal::{Portal, PortalDirection};
use crate::property::{Property, PropertyKind};
use crate::resources::ResourceLookup;
use crate::tokens::{BehaviourToken, CommentToken, ItemHeader, ItemToken, LinkToken, Point};
use crate::errors::check_finite;
use crate::{GraphError, ResourceId, Result};

/// Behaviour type of boundary items.
pub const PORTAL_BEHAVIOUR: &str = "Portal";

/// Behaviour type of asset-bound items.
pub const ASSET_BEHAVIOUR: &str = "Asset";

pub const DEFAULT_COMMENT_LABEL: &str = "Comment";
pub const DEFAULT_COMMENT_WIDTH: f64 = 150.0;
pub const DEFAULT_COMMENT_HEIGHT: f64 = 50.0;

/// A node with an ordered list of portals
#[derive(Debug, Clone, PartialEq)]
pub struct Behaviour {
    pub alias: String,
    pub behaviour_type: String,
    portals: Vec<Portal>,
}

impl Behaviour {
    pub fn new(alias: impl Into<String>, behaviour_type: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            behaviour_type: behaviour_type.into(),
            portals: Vec::new(),
        }
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portal(&self, name: &str) -> Option<&Portal> {
        self.portals.iter().find(|portal| portal.name == name)
    }

    pub fn portal_mut(&mut self, name: &str) -> Option<&mut Portal> {
        self.portals.iter_mut().find(|portal| portal.name == name)
    }

    pub fn portal_index(&self, name: &str) -> Option<usize> {
        self.portals.iter().position(|portal| portal.name == name)
    }

    /// Append a portal exposing `property`. Portal names are unique per behaviour.
    pub fn add_portal(&mut self, direction: PortalDirection, property: Property) -> Result<&Portal> {
        let len = self.portals.len();
        self.insert_portal(len, Portal::new(direction, property))?;
        Ok(&self.portals[len])
    }

    /// Insert a portal at `index` (clamped to the end of the list).
    pub fn insert_portal(&mut self, index: usize, portal: Portal) -> Result<()> {
        portal.property.check_finite()?;
        if self.portal(&portal.name).is_some() {
            return Err(GraphError::invalid(format!(
                "behaviour '{}' already has a portal named '{}'",
                self.alias, portal.name
            )));
        }
        let index = index.min(self.portals.len());
        self.portals.insert(index, portal);
        Ok(())
    }

    /// Detach a portal, returning it with the index it held. Links are not touched
    /// here; see [`crate::ContainerSchema::remove_portal`].
    pub fn remove_portal(&mut self, name: &str) -> Option<(usize, Portal)> {
        let index = self.portal_index(name)?;
        Some((index, self.portals.remove(index)))
    }

    fn tokenize(&self, header: ItemHeader) -> BehaviourToken {
        BehaviourToken {
            header,
            alias: self.alias.clone(),
            behaviour_type: self.behaviour_type.clone(),
            portals: self.portals.iter().map(Portal::tokenize).collect(),
        }
    }

    fn from_token(token: &BehaviourToken, lookup: &dyn ResourceLookup) -> Result<Self> {
        let mut behaviour = Behaviour::new(token.alias.clone(), token.behaviour_type.clone());
        for portal in &token.portals {
            let portal = Portal::from_token(portal, lookup)?;
            let len = behaviour.portals.len();
            behaviour.insert_portal(len, portal)?;
        }
        Ok(behaviour)
    }
}

/// A behaviour bound to an asset through one of its parameter portals.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourAsset {
    pub behaviour: Behaviour,
}

impl BehaviourAsset {
    pub fn new(behaviour: Behaviour) -> Self {
        Self { behaviour }
    }

    /// The bound asset, read from the most recently added parameter portal holding
    /// an asset property. Always in step with that property's value.
    pub fn asset(&self) -> Option<ResourceId> {
        self.behaviour
            .portals()
            .iter()
            .rev()
            .find(|portal| {
                portal.direction == PortalDirection::Parameter
                    && portal.property.kind() == PropertyKind::Asset
            })
            .and_then(|portal| portal.property.asset_value())
    }
}

/// A behaviour that stands for one portal of the enclosing sub-graph.
///
/// `exposed` is the direction seen from outside; the single inner portal faces
/// the other way so it can be linked from within the sub-graph.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourPortal {
    pub behaviour: Behaviour,
    exposed: PortalDirection,
}

impl BehaviourPortal {
    pub fn new(exposed: PortalDirection, property: Property) -> Self {
        let mut behaviour = Behaviour::new(property.name.clone(), PORTAL_BEHAVIOUR);
        behaviour.portals.push(Portal::new(exposed.inverse(), property));
        Self { behaviour, exposed }
    }

    pub fn exposed(&self) -> PortalDirection {
        self.exposed
    }

    pub fn portal(&self) -> Option<&Portal> {
        self.behaviour.portals().first()
    }

    fn from_token(token: &BehaviourToken, lookup: &dyn ResourceLookup) -> Result<Self> {
        let behaviour = Behaviour::from_token(token, lookup)?;
        let exposed = match behaviour.portals() {
            [portal] => portal.direction.inverse(),
            portals => {
                return Err(GraphError::invalid(format!(
                    "portal behaviour '{}' must carry exactly one portal, found {}",
                    token.alias,
                    portals.len()
                )))
            }
        };
        Ok(Self { behaviour, exposed })
    }
}

/// Free-form annotation box
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub label: String,
    pub width: f64,
    pub height: f64,
}

impl Comment {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: DEFAULT_COMMENT_WIDTH,
            height: DEFAULT_COMMENT_HEIGHT,
        }
    }
}

impl Default for Comment {
    fn default() -> Self {
        Self::new(DEFAULT_COMMENT_LABEL)
    }
}

/// Directed edge from a source portal to a sink portal
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub start_behaviour: ShallowId,
    pub start_portal: String,
    pub end_behaviour: ShallowId,
    pub end_portal: String,
    pub points: Vec<Point>,
}

impl Link {
    pub fn new(
        start_behaviour: ShallowId,
        start_portal: impl Into<String>,
        end_behaviour: ShallowId,
        end_portal: impl Into<String>,
    ) -> Self {
        Self {
            start_behaviour,
            start_portal: start_portal.into(),
            end_behaviour,
            end_portal: end_portal.into(),
            points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    /// True when either endpoint is the behaviour `id`.
    pub fn touches(&self, id: ShallowId) -> bool {
        self.start_behaviour == id || self.end_behaviour == id
    }

    /// True when either endpoint is portal `name` on behaviour `id`.
    pub fn touches_portal(&self, id: ShallowId, name: &str) -> bool {
        (self.start_behaviour == id && self.start_portal == name)
            || (self.end_behaviour == id && self.end_portal == name)
    }

    pub(crate) fn endpoints(&self) -> (ShallowId, &str, ShallowId, &str) {
        (
            self.start_behaviour,
            self.start_portal.as_str(),
            self.end_behaviour,
            self.end_portal.as_str(),
        )
    }

    pub(crate) fn check_finite(&self) -> Result<()> {
        for point in &self.points {
            check_finite("link point x", point.x)?;
            check_finite("link point y", point.y)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Behaviour(Behaviour),
    Asset(BehaviourAsset),
    PortalBehaviour(BehaviourPortal),
    Comment(Comment),
    Link(Link),
}

/// Second-pass entry of a deserialized batch, keyed by serialized position.
#[derive(Debug, Clone, Copy)]
pub struct LinkEntry<'a> {
    pub id: ShallowId,
    pub token: &'a ItemToken,
}

/// Anything placed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    id: ShallowId,
    pub left: f64,
    pub top: f64,
    pub selected: bool,
    pub kind: ItemKind,
}

impl CanvasItem {
    pub fn new(id: ShallowId, left: f64, top: f64, kind: ItemKind) -> Self {
        Self {
            id,
            left,
            top,
            selected: false,
            kind,
        }
    }

    pub fn id(&self) -> ShallowId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ItemKind::Behaviour(_) => "behaviour",
            ItemKind::Asset(_) => "asset",
            ItemKind::PortalBehaviour(_) => "portal-behaviour",
            ItemKind::Comment(_) => "comment",
            ItemKind::Link(_) => "link",
        }
    }

    /// Behaviour part of the three behaviour-like kinds.
    pub fn behaviour(&self) -> Option<&Behaviour> {
        match &self.kind {
            ItemKind::Behaviour(behaviour) => Some(behaviour),
            ItemKind::Asset(asset) => Some(&asset.behaviour),
            ItemKind::PortalBehaviour(portal) => Some(&portal.behaviour),
            _ => None,
        }
    }

    pub fn behaviour_mut(&mut self) -> Option<&mut Behaviour> {
        match &mut self.kind {
            ItemKind::Behaviour(behaviour) => Some(behaviour),
            ItemKind::Asset(asset) => Some(&mut asset.behaviour),
            ItemKind::PortalBehaviour(portal) => Some(&mut portal.behaviour),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&Comment> {
        match &self.kind {
            ItemKind::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn comment_mut(&mut self) -> Option<&mut Comment> {
        match &mut self.kind {
            ItemKind::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match &self.kind {
            ItemKind::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn is_behaviour(&self) -> bool {
        self.behaviour().is_some()
    }

    /// Position, size, link geometry and number values are all finite, so the
    /// item survives a write to JSON.
    pub fn check_finite(&self) -> Result<()> {
        check_finite("left", self.left)?;
        check_finite("top", self.top)?;
        match &self.kind {
            ItemKind::Comment(comment) => {
                check_finite("comment width", comment.width)?;
                check_finite("comment height", comment.height)
            }
            ItemKind::Link(link) => link.check_finite(),
            _ => self
                .behaviour()
                .map_or(Ok(()), |behaviour| {
                    behaviour
                        .portals()
                        .iter()
                        .try_for_each(|portal| portal.property.check_finite())
                }),
        }
    }

    /// True for links with an endpoint on behaviour `id`.
    pub fn references(&self, id: ShallowId) -> bool {
        self.as_link().is_some_and(|link| link.touches(id))
    }

    /// Detached copy with identical fields and a freshly minted id.
    pub fn duplicate(&self, ids: &mut IdAllocator) -> CanvasItem {
        CanvasItem {
            id: ids.mint(),
            ..self.clone()
        }
    }

    /// Token form at serialized `position`. `positions` maps live ids to their
    /// serialized positions so link endpoints can be written positionally.
    pub fn serialize(&self, position: u32, positions: &HashMap<ShallowId, u32>) -> Result<ItemToken> {
        trace!(id = %self.id, position, kind = self.type_name(), "Serializing item");

        let header = ItemHeader {
            id: position,
            left: self.left,
            top: self.top,
            selected: self.selected,
        };

        let token = match &self.kind {
            ItemKind::Behaviour(behaviour) => ItemToken::Behaviour(behaviour.tokenize(header)),
            ItemKind::Asset(asset) => ItemToken::Asset(asset.behaviour.tokenize(header)),
            ItemKind::PortalBehaviour(portal) => {
                ItemToken::PortalBehaviour(portal.behaviour.tokenize(header))
            }
            ItemKind::Comment(comment) => ItemToken::Comment(CommentToken {
                header,
                label: comment.label.clone(),
                width: comment.width,
                height: comment.height,
            }),
            ItemKind::Link(link) => {
                let endpoint = |id: ShallowId| {
                    positions.get(&id).copied().ok_or_else(|| {
                        GraphError::dangling(format!("link {} points at missing behaviour {}", self.id, id))
                    })
                };
                ItemToken::Link(LinkToken {
                    header,
                    start_behaviour: endpoint(link.start_behaviour)?,
                    end_behaviour: endpoint(link.end_behaviour)?,
                    start_portal: link.start_portal.clone(),
                    end_portal: link.end_portal.clone(),
                    points: link.points.clone(),
                })
            }
        };

        Ok(token)
    }

    /// First deserialization pass. Links come back with unresolved endpoints until
    /// [`CanvasItem::link`] runs over the whole batch.
    pub fn deserialize(
        token: &ItemToken,
        ids: &mut IdAllocator,
        lookup: &dyn ResourceLookup,
    ) -> Result<CanvasItem> {
        let kind = match token {
            ItemToken::Behaviour(token) => ItemKind::Behaviour(Behaviour::from_token(token, lookup)?),
            ItemToken::Asset(token) => {
                ItemKind::Asset(BehaviourAsset::new(Behaviour::from_token(token, lookup)?))
            }
            ItemToken::PortalBehaviour(token) => {
                ItemKind::PortalBehaviour(BehaviourPortal::from_token(token, lookup)?)
            }
            ItemToken::Comment(token) => ItemKind::Comment(Comment {
                label: token.label.clone(),
                width: token.width,
                height: token.height,
            }),
            ItemToken::Link(token) => ItemKind::Link(Link {
                start_behaviour: ShallowId::UNRESOLVED,
                start_portal: token.start_portal.clone(),
                end_behaviour: ShallowId::UNRESOLVED,
                end_portal: token.end_portal.clone(),
                points: token.points.clone(),
            }),
        };

        let header = token.header();
        let mut item = CanvasItem::new(ids.mint(), header.left, header.top, kind);
        item.selected = header.selected;
        trace!(id = %item.id, position = header.id, kind = item.type_name(), "Deserialized item");
        Ok(item)
    }

    /// Second deserialization pass: point link endpoints at the items created for
    /// the serialized positions named in `token`. Other kinds are left as they are.
    pub fn link(&mut self, token: &ItemToken, link_map: &HashMap<u32, LinkEntry<'_>>) -> Result<()> {
        let (ItemKind::Link(link), ItemToken::Link(token)) = (&mut self.kind, token) else {
            return Ok(());
        };

        let resolve = |position: u32, portal: &str| -> Result<ShallowId> {
            let entry = link_map.get(&position).ok_or_else(|| {
                GraphError::dangling(format!("link endpoint {} does not exist", position))
            })?;
            let behaviour = entry.token.behaviour().ok_or_else(|| {
                GraphError::dangling(format!("link endpoint {} is not a behaviour", position))
            })?;
            if !behaviour.has_portal(portal) {
                return Err(GraphError::dangling(format!(
                    "behaviour '{}' has no portal '{}'",
                    behaviour.alias, portal
                )));
            }
            Ok(entry.id)
        };

        link.start_behaviour = resolve(token.start_behaviour, &token.start_portal)?;
        link.end_behaviour = resolve(token.end_behaviour, &token.end_portal)?;
        Ok(())
    }
}
