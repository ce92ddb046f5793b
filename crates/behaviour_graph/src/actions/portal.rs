use super::behaviour::take_single;
use super::ActionState;
use crate::ids::ShallowId;
use crate::items::{BehaviourPortal, CanvasItem, ItemKind};
use crate::portal::PortalDirection;
use crate::property::{Property, Value};
use crate::schema::{ContainerSchema, RemovedPortal};
use crate::{GraphError, Result};

/// Add a portal to a behaviour, or with no target, place a standalone portal
/// behaviour on the canvas.
#[derive(Debug, Clone)]
pub struct PortalCreated {
    target: Option<ShallowId>,
    direction: PortalDirection,
    property: Property,
    left: f64,
    top: f64,
    state: ActionState<ShallowId, Option<CanvasItem>>,
}

impl PortalCreated {
    const NAME: &'static str = "PortalCreated";

    pub fn new(target: Option<ShallowId>, direction: PortalDirection, property: Property) -> Self {
        Self {
            target,
            direction,
            property,
            left: 0.0,
            top: 0.0,
            state: ActionState::Unapplied,
        }
    }

    /// Canvas position of a standalone portal behaviour.
    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// The behaviour that received the portal, or the standalone item, while applied.
    pub fn instance(&self) -> Option<ShallowId> {
        self.state.applied().copied()
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let memo = self.state.redo_memo(Self::NAME)?.cloned().flatten();

        let id = match self.target {
            Some(behaviour) => {
                schema.add_portal(behaviour, self.direction, self.property.clone())?;
                behaviour
            }
            None => {
                let item = match memo {
                    Some(item) => item,
                    None => CanvasItem::new(
                        schema.mint_id(),
                        self.left,
                        self.top,
                        ItemKind::PortalBehaviour(BehaviourPortal::new(
                            self.direction,
                            self.property.clone(),
                        )),
                    ),
                };
                schema.add_item(item)?
            }
        };

        self.state = ActionState::Applied(id);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let id = *self.state.undo_memo(Self::NAME)?;

        let memo = match self.target {
            Some(behaviour) => {
                schema.remove_portal(behaviour, &self.property.name)?;
                None
            }
            None => Some(take_single(schema, id)?),
        };

        self.state = ActionState::Undone(memo);
        Ok(())
    }
}

/// Detach a portal from a behaviour together with its links.
#[derive(Debug, Clone)]
pub struct PortalRemoved {
    behaviour: ShallowId,
    portal: String,
    state: ActionState<RemovedPortal>,
}

impl PortalRemoved {
    const NAME: &'static str = "PortalRemoved";

    pub fn new(schema: &ContainerSchema, behaviour: ShallowId, portal: impl Into<String>) -> Result<Self> {
        let portal = portal.into();
        let exists = schema
            .require(behaviour)?
            .behaviour()
            .is_some_and(|target| target.portal(&portal).is_some());
        if !exists {
            return Err(GraphError::dangling(format!(
                "item {} has no portal '{}'",
                behaviour, portal
            )));
        }

        Ok(Self {
            behaviour,
            portal,
            state: ActionState::Unapplied,
        })
    }

    /// Links cascaded away by the last redo.
    pub fn removed_links(&self) -> Option<usize> {
        self.state.applied().map(|removed| removed.links.len())
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let removed = schema.remove_portal(self.behaviour, &self.portal)?;
        self.state = ActionState::Applied(removed);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let removed = self.state.undo_memo(Self::NAME)?.clone();
        schema.restore_portal(removed)?;
        self.state = ActionState::Undone(());
        Ok(())
    }
}

/// Set the value of the property behind one portal.
#[derive(Debug, Clone)]
pub struct PropertyChanged {
    behaviour: ShallowId,
    portal: String,
    value: Value,
    state: ActionState<Value>,
}

impl PropertyChanged {
    const NAME: &'static str = "PropertyChanged";

    pub fn new(behaviour: ShallowId, portal: impl Into<String>, value: Value) -> Self {
        Self {
            behaviour,
            portal: portal.into(),
            value,
            state: ActionState::Unapplied,
        }
    }

    pub fn previous(&self) -> Option<&Value> {
        self.state.applied()
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let property = property_mut(schema, self.behaviour, &self.portal)?;
        let previous = property.value().clone();
        property.set_value(self.value.clone())?;
        self.state = ActionState::Applied(previous);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let previous = self.state.undo_memo(Self::NAME)?.clone();
        property_mut(schema, self.behaviour, &self.portal)?.set_value(previous)?;
        self.state = ActionState::Undone(());
        Ok(())
    }
}

fn property_mut<'a>(
    schema: &'a mut ContainerSchema,
    behaviour: ShallowId,
    portal: &str,
) -> Result<&'a mut Property> {
    let target = schema
        .require_mut(behaviour)?
        .behaviour_mut()
        .ok_or_else(|| GraphError::invalid(format!("item {} is not a behaviour", behaviour)))?;
    let alias = target.alias.clone();
    target
        .portal_mut(portal)
        .map(|portal| &mut portal.property)
        .ok_or_else(|| GraphError::dangling(format!("behaviour '{}' has no portal '{}'", alias, portal)))
}
