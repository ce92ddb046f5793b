use std::collections::HashSet;

use super::ActionState;
use crate::errors::check_finite;
use crate::ids::ShallowId;
use crate::items::{CanvasItem, PORTAL_BEHAVIOUR};
use crate::schema::{ContainerSchema, RemovedItem};
use crate::template::BehaviourTemplate;
use crate::{GraphError, Result};

/// Place a new behaviour built from a template.
#[derive(Debug, Clone)]
pub struct BehaviourCreated {
    template: BehaviourTemplate,
    alias: String,
    left: f64,
    top: f64,
    state: ActionState<ShallowId, CanvasItem>,
}

impl BehaviourCreated {
    const NAME: &'static str = "BehaviourCreated";

    pub fn new(template: &BehaviourTemplate, alias: impl Into<String>, left: f64, top: f64) -> Result<Self> {
        if template.name == PORTAL_BEHAVIOUR {
            return Err(GraphError::invalid(
                "portal behaviours are created with PortalCreated",
            ));
        }
        check_finite("left", left)?;
        check_finite("top", top)?;

        Ok(Self {
            template: template.clone(),
            alias: alias.into(),
            left,
            top,
            state: ActionState::Unapplied,
        })
    }

    /// Id of the created behaviour while the action is applied.
    pub fn instance(&self) -> Option<ShallowId> {
        self.state.applied().copied()
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let item = match self.state.redo_memo(Self::NAME)? {
            Some(item) => item.clone(),
            None => {
                let kind = self.template.instantiate(self.alias.clone())?;
                CanvasItem::new(schema.mint_id(), self.left, self.top, kind)
            }
        };

        let id = schema.add_item(item)?;
        self.state = ActionState::Applied(id);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let id = *self.state.undo_memo(Self::NAME)?;
        let item = take_single(schema, id)?;
        self.state = ActionState::Undone(item);
        Ok(())
    }
}

/// Remove a set of items. Links attached to removed behaviours go with them and
/// come back on undo.
#[derive(Debug, Clone)]
pub struct BehavioursRemoved {
    targets: Vec<ShallowId>,
    state: ActionState<Vec<RemovedItem>>,
}

impl BehavioursRemoved {
    const NAME: &'static str = "BehavioursRemoved";

    pub fn new(schema: &ContainerSchema, targets: Vec<ShallowId>) -> Result<Self> {
        check_targets(schema, &targets)?;
        Ok(Self {
            targets,
            state: ActionState::Unapplied,
        })
    }

    /// Remove whatever is selected.
    pub fn selected(schema: &ContainerSchema) -> Result<Self> {
        Self::new(schema, schema.selection())
    }

    pub fn targets(&self) -> &[ShallowId] {
        &self.targets
    }

    /// Everything the last redo removed, cascaded links included.
    pub fn removed(&self) -> Option<&[RemovedItem]> {
        self.state.applied().map(Vec::as_slice)
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let removed = schema.remove_items(&self.targets)?;
        self.state = ActionState::Applied(removed);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let removed = self.state.undo_memo(Self::NAME)?.clone();
        schema.restore_items(removed)?;
        self.state = ActionState::Undone(());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Duplicated {
    pub copies: Vec<ShallowId>,
    pub previous_selection: Vec<ShallowId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatesUndone {
    copies: Vec<RemovedItem>,
}

/// Copy items with fresh ids, offset on the canvas, and select the copies.
#[derive(Debug, Clone)]
pub struct ItemsDuplicated {
    targets: Vec<ShallowId>,
    offset: f64,
    state: ActionState<Duplicated, DuplicatesUndone>,
}

impl ItemsDuplicated {
    const NAME: &'static str = "ItemsDuplicated";

    pub fn new(schema: &ContainerSchema, targets: Vec<ShallowId>, offset: f64) -> Result<Self> {
        check_targets(schema, &targets)?;
        if !offset.is_finite() {
            return Err(GraphError::invalid(format!("{} is not a usable offset", offset)));
        }
        Ok(Self {
            targets,
            offset,
            state: ActionState::Unapplied,
        })
    }

    pub fn copies(&self) -> Option<&[ShallowId]> {
        self.state.applied().map(|memo| memo.copies.as_slice())
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let previous_selection = schema.selection();
        let copies = match self.state.redo_memo(Self::NAME)? {
            Some(undone) => {
                let ids: Vec<ShallowId> = undone.copies.iter().map(|(_, item)| item.id()).collect();
                schema.restore_items(undone.copies.clone())?;
                ids
            }
            None => {
                let copies = schema.duplicates(&self.targets, self.offset)?;
                if copies.is_empty() {
                    return Err(GraphError::invalid(
                        "nothing to duplicate: links are only copied with both endpoints",
                    ));
                }
                schema.add_items(copies)?
            }
        };

        schema.set_selection(&copies)?;
        self.state = ActionState::Applied(Duplicated {
            copies,
            previous_selection,
        });
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let memo = self.state.undo_memo(Self::NAME)?.clone();
        let copies = schema.remove_items(&memo.copies)?;
        schema.set_selection(&memo.previous_selection)?;
        self.state = ActionState::Undone(DuplicatesUndone { copies });
        Ok(())
    }
}

fn check_targets(schema: &ContainerSchema, targets: &[ShallowId]) -> Result<()> {
    if targets.is_empty() {
        return Err(GraphError::invalid("no items to act on"));
    }
    let mut seen = HashSet::new();
    for id in targets {
        if !seen.insert(*id) {
            return Err(GraphError::invalid(format!("item {} is given more than once", id)));
        }
        schema.require(*id)?;
    }
    Ok(())
}

/// Remove one item and hand it back, for undoing a creation.
pub(super) fn take_single(schema: &mut ContainerSchema, id: ShallowId) -> Result<CanvasItem> {
    schema
        .remove_items(&[id])?
        .into_iter()
        .map(|(_, item)| item)
        .find(|item| item.id() == id)
        .ok_or_else(|| GraphError::dangling(format!("item {} does not exist", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::LinkCreated;
    use crate::items::{ItemKind, Link};
    use crate::portal::PortalDirection;
    use crate::property::Property;

    fn template() -> BehaviourTemplate {
        BehaviourTemplate::new("Relay")
            .with_portal(PortalDirection::Input, Property::bool("In", false))
            .with_portal(PortalDirection::Output, Property::bool("Out", false))
    }

    fn create(schema: &mut ContainerSchema, alias: &str, left: f64) -> ShallowId {
        let mut action = BehaviourCreated::new(&template(), alias, left, 0.0).unwrap();
        action.redo(schema).unwrap();
        action.instance().unwrap()
    }

    #[test]
    fn test_created_behaviour_keeps_identity_across_undo() {
        let mut schema = ContainerSchema::new();
        let mut action = BehaviourCreated::new(&template(), "A", 10.0, 20.0).unwrap();

        action.redo(&mut schema).unwrap();
        let id = action.instance().unwrap();
        let item = schema.get(id).unwrap();
        assert_eq!(item.behaviour().unwrap().alias, "A");
        assert_eq!((item.left, item.top), (10.0, 20.0));

        action.undo(&mut schema).unwrap();
        assert!(schema.is_empty());
        assert_eq!(action.instance(), None);

        action.redo(&mut schema).unwrap();
        assert_eq!(action.instance(), Some(id));
    }

    #[test]
    fn test_portal_template_is_rejected() {
        let template = BehaviourTemplate::new(PORTAL_BEHAVIOUR);
        assert!(matches!(
            BehaviourCreated::new(&template, "Edge", 0.0, 0.0),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_remove_selected() {
        let mut schema = ContainerSchema::new();
        let a = create(&mut schema, "A", 0.0);
        create(&mut schema, "B", 100.0);

        assert!(BehavioursRemoved::selected(&schema).is_err());

        schema.set_selection(&[a]).unwrap();
        let mut action = BehavioursRemoved::selected(&schema).unwrap();
        assert_eq!(action.targets(), &[a]);

        action.redo(&mut schema).unwrap();
        assert_eq!(action.removed().unwrap().len(), 1);
        assert_eq!(schema.len(), 1);

        action.undo(&mut schema).unwrap();
        assert_eq!(schema.items()[0].id(), a);
        assert!(schema.items()[0].selected);
    }

    #[test]
    fn test_duplicate_selects_copies_and_undo_restores_selection() {
        let mut schema = ContainerSchema::new();
        let a = create(&mut schema, "A", 0.0);
        let b = create(&mut schema, "B", 100.0);
        let mut link = LinkCreated::new(Link::new(a, "Out", b, "In")).unwrap();
        link.redo(&mut schema).unwrap();
        schema.set_selection(&[a]).unwrap();

        let mut action = ItemsDuplicated::new(&schema, vec![a, b], 20.0).unwrap();
        action.redo(&mut schema).unwrap();

        let copies = action.copies().unwrap().to_vec();
        assert_eq!(copies.len(), 3);
        assert_eq!(schema.selection(), copies);
        assert_eq!(schema.get(copies[0]).unwrap().left, 20.0);
        assert!(matches!(schema.get(copies[2]).unwrap().kind, ItemKind::Link(_)));

        action.undo(&mut schema).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.selection(), vec![a]);

        action.redo(&mut schema).unwrap();
        assert_eq!(action.copies().unwrap(), copies.as_slice());
    }
}
