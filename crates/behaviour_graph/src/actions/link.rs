use super::behaviour::take_single;
use super::ActionState;
use crate::ids::ShallowId;
use crate::items::{CanvasItem, ItemKind, Link};
use crate::schema::ContainerSchema;
use crate::{GraphError, Result};

/// Connect a source portal to a sink portal.
#[derive(Debug, Clone)]
pub struct LinkCreated {
    link: Link,
    state: ActionState<ShallowId, CanvasItem>,
}

impl LinkCreated {
    const NAME: &'static str = "LinkCreated";

    /// Endpoint existence and portal directions are checked when the link is added.
    pub fn new(link: Link) -> Result<Self> {
        if link.start_behaviour == link.end_behaviour {
            return Err(GraphError::invalid(format!(
                "link on {} joins a behaviour to itself",
                link.start_behaviour
            )));
        }
        link.check_finite()?;

        Ok(Self {
            link,
            state: ActionState::Unapplied,
        })
    }

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
                let (left, top) = self
                    .link
                    .points
                    .first()
                    .map(|point| (point.x, point.y))
                    .unwrap_or_default();
                CanvasItem::new(schema.mint_id(), left, top, ItemKind::Link(self.link.clone()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::BehaviourCreated;
    use crate::portal::PortalDirection;
    use crate::property::Property;
    use crate::template::BehaviourTemplate;
    use crate::tokens::Point;

    fn relay(schema: &mut ContainerSchema) -> ShallowId {
        let template = BehaviourTemplate::new("Relay")
            .with_portal(PortalDirection::Input, Property::bool("In", false))
            .with_portal(PortalDirection::Output, Property::bool("Out", false));
        let mut action = BehaviourCreated::new(&template, "Relay", 0.0, 0.0).unwrap();
        action.redo(schema).unwrap();
        action.instance().unwrap()
    }

    #[test]
    fn test_self_link_fails_at_construction() {
        let mut schema = ContainerSchema::new();
        let a = relay(&mut schema);
        assert!(matches!(
            LinkCreated::new(Link::new(a, "Out", a, "In")),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_non_finite_points_fail_at_construction() {
        let mut schema = ContainerSchema::new();
        let a = relay(&mut schema);
        let b = relay(&mut schema);

        let bent = Link::new(a, "Out", b, "In")
            .with_points(vec![Point::new(1.0, 1.0), Point::new(f64::NAN, 2.0)]);
        assert!(matches!(LinkCreated::new(bent), Err(GraphError::InvalidArgument(_))));
    }

    #[test]
    fn test_link_geometry_and_undo() {
        let mut schema = ContainerSchema::new();
        let a = relay(&mut schema);
        let b = relay(&mut schema);

        let link = Link::new(a, "Out", b, "In").with_points(vec![Point::new(4.0, 8.0)]);
        let mut action = LinkCreated::new(link).unwrap();
        action.redo(&mut schema).unwrap();

        let item = schema.get(action.instance().unwrap()).unwrap();
        assert_eq!((item.left, item.top), (4.0, 8.0));
        assert_eq!(item.as_link().unwrap().points.len(), 1);

        action.undo(&mut schema).unwrap();
        assert_eq!(schema.links().count(), 0);
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_link_to_wrong_direction_fails_on_redo_without_mutation() {
        let mut schema = ContainerSchema::new();
        let a = relay(&mut schema);
        let b = relay(&mut schema);

        let mut action = LinkCreated::new(Link::new(a, "In", b, "Out")).unwrap();
        assert!(action.redo(&mut schema).is_err());
        assert!(!action.is_applied());
        assert_eq!(schema.len(), 2);
    }
}
