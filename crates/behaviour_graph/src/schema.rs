//! The container schema: the ordered item set every editing action mutates.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::ids::{IdAllocator, ShallowId};
use crate::items::{CanvasItem, ItemKind, Link, LinkEntry};
use crate::portal::{Portal, PortalDirection};
use crate::property::Property;
use crate::resources::ResourceLookup;
use crate::tokens::ItemToken;
use crate::{GraphError, Result};

/// An item taken out of the schema together with the index it occupied.
pub type RemovedItem = (usize, CanvasItem);

/// A portal detached from its behaviour, with the links that were cascaded away.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedPortal {
    pub behaviour: ShallowId,
    pub index: usize,
    pub portal: Portal,
    pub links: Vec<RemovedItem>,
}

/// Ordered set of canvas items plus the allocator that names them.
///
/// Item order is the z-order and the index space gestures address. Selection is
/// kept on the items themselves, so it can only ever name live items.
#[derive(Debug, Clone, Default)]
pub struct ContainerSchema {
    items: Vec<CanvasItem>,
    ids: IdAllocator,
}

impl ContainerSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from a token sequence.
    pub fn from_tokens(tokens: &[ItemToken], lookup: &dyn ResourceLookup) -> Result<Self> {
        let mut schema = Self::new();
        schema.load(tokens, lookup)?;
        Ok(schema)
    }

    pub fn mint_id(&mut self) -> ShallowId {
        self.ids.mint()
    }

    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn items(&self) -> &[CanvasItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_at(&self, index: usize) -> Option<&CanvasItem> {
        self.items.get(index)
    }

    pub fn index_of(&self, id: ShallowId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: ShallowId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: ShallowId) -> Option<&CanvasItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: ShallowId) -> Option<&mut CanvasItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Like [`ContainerSchema::get`], but a missing item is a dangling reference.
    pub fn require(&self, id: ShallowId) -> Result<&CanvasItem> {
        self.get(id)
            .ok_or_else(|| GraphError::dangling(format!("item {} does not exist", id)))
    }

    pub fn require_mut(&mut self, id: ShallowId) -> Result<&mut CanvasItem> {
        self.get_mut(id)
            .ok_or_else(|| GraphError::dangling(format!("item {} does not exist", id)))
    }

    pub fn behaviours(&self) -> impl Iterator<Item = &CanvasItem> {
        self.items.iter().filter(|item| item.is_behaviour())
    }

    pub fn links(&self) -> impl Iterator<Item = (ShallowId, &Link)> {
        self.items
            .iter()
            .filter_map(|item| item.as_link().map(|link| (item.id(), link)))
    }

    /// Append an item. Links must join an existing source portal to an existing
    /// sink portal on another behaviour.
    pub fn add_item(&mut self, item: CanvasItem) -> Result<ShallowId> {
        self.add_items(vec![item])?.first().copied().ok_or_else(|| {
            GraphError::InvalidState("no item was added".to_string())
        })
    }

    /// Append a batch of items. Links in the batch may point at behaviours from the
    /// same batch. Nothing is added unless the whole batch is valid.
    pub fn add_items(&mut self, items: Vec<CanvasItem>) -> Result<Vec<ShallowId>> {
        let mut seen: HashSet<ShallowId> = self.items.iter().map(CanvasItem::id).collect();
        let mut batch = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(GraphError::DuplicateIdentity(format!("item {}", item.id())));
            }
            item.check_finite()?;
            batch.insert(item.id());
        }

        let start = self.items.len();
        self.items.extend(items);
        if let Err(err) = check_links(&self.items, &batch) {
            self.items.truncate(start);
            return Err(err);
        }

        let added: Vec<ShallowId> = self.items[start..].iter().map(CanvasItem::id).collect();
        for item in &self.items[start..] {
            debug!(id = %item.id(), kind = item.type_name(), "Item added");
        }
        Ok(added)
    }

    /// Remove items by id, cascading to every link that names a removed behaviour.
    /// Returns what was removed in ascending index order.
    pub fn remove_items(&mut self, ids: &[ShallowId]) -> Result<Vec<RemovedItem>> {
        for id in ids {
            self.require(*id)?;
        }

        let targets: HashSet<ShallowId> = ids.iter().copied().collect();
        let doomed: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                targets.contains(&item.id())
                    || item.as_link().is_some_and(|link| {
                        targets.contains(&link.start_behaviour) || targets.contains(&link.end_behaviour)
                    })
            })
            .map(|(index, _)| index)
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for index in doomed.into_iter().rev() {
            let item = self.items.remove(index);
            debug!(id = %item.id(), kind = item.type_name(), index, "Item removed");
            removed.push((index, item));
        }
        removed.reverse();
        Ok(removed)
    }

    /// Put removed items back at the indices they held.
    pub fn restore_items(&mut self, mut removed: Vec<RemovedItem>) -> Result<()> {
        let mut seen: HashSet<ShallowId> = self.items.iter().map(CanvasItem::id).collect();
        let mut batch = HashSet::with_capacity(removed.len());
        for (_, item) in &removed {
            if !seen.insert(item.id()) {
                return Err(GraphError::DuplicateIdentity(format!("item {}", item.id())));
            }
            batch.insert(item.id());
        }

        let snapshot = self.items.clone();
        removed.sort_by_key(|(index, _)| *index);
        for (index, item) in removed {
            debug!(id = %item.id(), kind = item.type_name(), index, "Item restored");
            let index = index.min(self.items.len());
            self.items.insert(index, item);
        }

        if let Err(err) = check_links(&self.items, &batch) {
            self.items = snapshot;
            return Err(err);
        }
        Ok(())
    }

    /// Ids of selected items, in item order.
    pub fn selection(&self) -> Vec<ShallowId> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(CanvasItem::id)
            .collect()
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.selected)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn clear_selection(&mut self) {
        for item in &mut self.items {
            item.selected = false;
        }
    }

    /// Replace the selection with exactly `ids`.
    pub fn set_selection(&mut self, ids: &[ShallowId]) -> Result<()> {
        for id in ids {
            self.require(*id)?;
        }
        for item in &mut self.items {
            item.selected = ids.contains(&item.id());
        }
        debug!(selected = ids.len(), "Selection changed");
        Ok(())
    }

    /// Add a portal to a behaviour. Portal behaviours keep their single portal.
    pub fn add_portal(
        &mut self,
        behaviour: ShallowId,
        direction: PortalDirection,
        property: Property,
    ) -> Result<()> {
        let index = self.open_behaviour(behaviour)?.portals().len();
        self.insert_portal(behaviour, index, Portal::new(direction, property))
    }

    pub fn insert_portal(&mut self, behaviour: ShallowId, index: usize, portal: Portal) -> Result<()> {
        let target = self.open_behaviour(behaviour)?;
        let name = portal.name.clone();
        target.insert_portal(index, portal)?;
        debug!(behaviour = %behaviour, portal = %name, "Portal added");
        Ok(())
    }

    /// Detach a portal and every link attached to it.
    pub fn remove_portal(&mut self, behaviour: ShallowId, name: &str) -> Result<RemovedPortal> {
        if self.open_behaviour(behaviour)?.portal(name).is_none() {
            return Err(GraphError::dangling(format!(
                "behaviour {} has no portal '{}'",
                behaviour, name
            )));
        }

        let attached: Vec<ShallowId> = self
            .links()
            .filter(|(_, link)| link.touches_portal(behaviour, name))
            .map(|(id, _)| id)
            .collect();
        let links = self.remove_items(&attached)?;

        let (index, portal) = self
            .open_behaviour(behaviour)?
            .remove_portal(name)
            .ok_or_else(|| GraphError::dangling(format!("portal '{}' vanished", name)))?;
        debug!(behaviour = %behaviour, portal = %name, links = links.len(), "Portal removed");

        Ok(RemovedPortal {
            behaviour,
            index,
            portal,
            links,
        })
    }

    /// Undo a [`ContainerSchema::remove_portal`].
    pub fn restore_portal(&mut self, removed: RemovedPortal) -> Result<()> {
        self.insert_portal(removed.behaviour, removed.index, removed.portal)?;
        self.restore_items(removed.links)
    }

    /// Behaviour that accepts portal edits.
    fn open_behaviour(&mut self, id: ShallowId) -> Result<&mut crate::Behaviour> {
        let item = self.require_mut(id)?;
        if matches!(item.kind, ItemKind::PortalBehaviour(_)) {
            return Err(GraphError::invalid(format!(
                "portal behaviour {} exposes exactly one portal",
                id
            )));
        }
        item.behaviour_mut()
            .ok_or_else(|| GraphError::invalid(format!("item {} is not a behaviour", id)))
    }

    /// Copies of `targets` with fresh ids, moved by `offset`. Links are copied when
    /// both endpoints are copied, and re-pointed at the copies.
    pub fn duplicates(&mut self, targets: &[ShallowId], offset: f64) -> Result<Vec<CanvasItem>> {
        for id in targets {
            self.require(*id)?;
        }

        let mut remap: HashMap<ShallowId, ShallowId> = HashMap::new();
        let mut copies = Vec::new();
        let sources: Vec<CanvasItem> = self
            .items
            .iter()
            .filter(|item| targets.contains(&item.id()) && item.as_link().is_none())
            .cloned()
            .collect();
        for item in sources {
            let mut copy = item.duplicate(&mut self.ids);
            copy.left += offset;
            copy.top += offset;
            copy.selected = false;
            remap.insert(item.id(), copy.id());
            copies.push(copy);
        }

        let links: Vec<CanvasItem> = self
            .items
            .iter()
            .filter(|item| {
                item.as_link().is_some_and(|link| {
                    remap.contains_key(&link.start_behaviour) && remap.contains_key(&link.end_behaviour)
                })
            })
            .cloned()
            .collect();
        for item in links {
            let mut copy = item.duplicate(&mut self.ids);
            copy.left += offset;
            copy.top += offset;
            copy.selected = false;
            if let ItemKind::Link(link) = &mut copy.kind {
                link.start_behaviour = remap[&link.start_behaviour];
                link.end_behaviour = remap[&link.end_behaviour];
                for point in &mut link.points {
                    point.x += offset;
                    point.y += offset;
                }
            }
            copies.push(copy);
        }

        Ok(copies)
    }

    /// Token sequence of the current items, in order.
    pub fn serialize(&self) -> Result<Vec<ItemToken>> {
        let positions: HashMap<ShallowId, u32> = self
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id(), position as u32))
            .collect();

        self.items
            .iter()
            .enumerate()
            .map(|(position, item)| item.serialize(position as u32, &positions))
            .collect()
    }

    /// Replace the contents with a deserialized token sequence.
    ///
    /// Tokens are ordered by their serialized id. All items are built first, then
    /// links are resolved against the whole batch. On any failure the schema is
    /// left exactly as it was.
    pub fn load(&mut self, tokens: &[ItemToken], lookup: &dyn ResourceLookup) -> Result<()> {
        let mut ordered: Vec<&ItemToken> = tokens.iter().collect();
        ordered.sort_by_key(|token| token.id());
        if let Some(pair) = ordered.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
            return Err(GraphError::DuplicateIdentity(format!(
                "serialized id {} appears more than once",
                pair[0].id()
            )));
        }

        let mut ids = self.ids.clone();
        let mut items = ordered
            .iter()
            .map(|token| CanvasItem::deserialize(token, &mut ids, lookup))
            .collect::<Result<Vec<_>>>()?;

        let link_map: HashMap<u32, LinkEntry<'_>> = ordered
            .iter()
            .zip(&items)
            .map(|(token, item)| {
                (
                    token.id(),
                    LinkEntry {
                        id: item.id(),
                        token: *token,
                    },
                )
            })
            .collect();
        for (item, token) in items.iter_mut().zip(&ordered) {
            item.link(token, &link_map)?;
        }
        let batch: HashSet<ShallowId> = items.iter().map(CanvasItem::id).collect();
        check_links(&items, &batch)?;

        debug!(items = items.len(), "Schema loaded");
        self.items = items;
        self.ids = ids;
        Ok(())
    }
}

fn find_portal<'a>(
    items: &'a [CanvasItem],
    index: &HashMap<ShallowId, usize>,
    id: ShallowId,
    name: &str,
) -> Result<&'a Portal> {
    let item = index
        .get(&id)
        .map(|position| &items[*position])
        .ok_or_else(|| GraphError::dangling(format!("behaviour {} does not exist", id)))?;
    let behaviour = item
        .behaviour()
        .ok_or_else(|| GraphError::dangling(format!("item {} is not a behaviour", id)))?;
    behaviour.portal(name).ok_or_else(|| {
        GraphError::dangling(format!("behaviour '{}' has no portal '{}'", behaviour.alias, name))
    })
}

/// Every link in `batch` joins a source portal to a sink portal on two live
/// behaviours and shares its endpoints with no other link. Links outside the
/// batch were checked when they were added.
fn check_links(items: &[CanvasItem], batch: &HashSet<ShallowId>) -> Result<()> {
    let (incoming, settled): (Vec<&CanvasItem>, Vec<&CanvasItem>) = items
        .iter()
        .filter(|item| item.as_link().is_some())
        .partition(|item| batch.contains(&item.id()));
    if incoming.is_empty() {
        return Ok(());
    }

    let index: HashMap<ShallowId, usize> = items
        .iter()
        .enumerate()
        .map(|(position, item)| (item.id(), position))
        .collect();
    let mut endpoints: HashSet<_> = settled
        .iter()
        .filter_map(|item| item.as_link())
        .map(Link::endpoints)
        .collect();

    for link in incoming.iter().filter_map(|item| item.as_link()) {
        if link.start_behaviour == link.end_behaviour {
            return Err(GraphError::invalid(format!(
                "link on {} joins a behaviour to itself",
                link.start_behaviour
            )));
        }

        let start = find_portal(items, &index, link.start_behaviour, &link.start_portal)?;
        let end = find_portal(items, &index, link.end_behaviour, &link.end_portal)?;
        if !start.direction.is_source() || !end.direction.is_sink() {
            return Err(GraphError::invalid(format!(
                "cannot link {} portal '{}' to {} portal '{}'",
                start.direction, start.name, end.direction, end.name
            )));
        }

        if !endpoints.insert(link.endpoints()) {
            return Err(GraphError::invalid(format!(
                "'{}' and '{}' are already linked",
                link.start_portal, link.end_portal
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Behaviour, Comment};
    use crate::resources::NoResources;
    use crate::tokens::Point;

    fn behaviour(schema: &mut ContainerSchema, alias: &str) -> ShallowId {
        let mut behaviour = Behaviour::new(alias, "Test");
        behaviour
            .add_portal(PortalDirection::Input, Property::bool("In", false))
            .unwrap();
        behaviour
            .add_portal(PortalDirection::Output, Property::bool("Out", false))
            .unwrap();
        let id = schema.mint_id();
        schema
            .add_item(CanvasItem::new(id, 0.0, 0.0, ItemKind::Behaviour(behaviour)))
            .unwrap()
    }

    fn link(schema: &mut ContainerSchema, from: ShallowId, to: ShallowId) -> Result<ShallowId> {
        let id = schema.mint_id();
        schema.add_item(CanvasItem::new(
            id,
            0.0,
            0.0,
            ItemKind::Link(Link::new(from, "Out", to, "In")),
        ))
    }

    #[test]
    fn test_add_item_rejects_duplicate_identity() {
        let mut schema = ContainerSchema::new();
        let id = behaviour(&mut schema, "A");
        let clash = CanvasItem::new(id, 5.0, 5.0, ItemKind::Comment(Comment::default()));

        let err = schema.add_item(clash).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentity(_)));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_link_validation() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");

        link(&mut schema, a, b).unwrap();
        assert!(matches!(link(&mut schema, a, b), Err(GraphError::InvalidArgument(_))));
        assert!(matches!(link(&mut schema, a, a), Err(GraphError::InvalidArgument(_))));

        let missing = schema.mint_id();
        assert!(matches!(
            link(&mut schema, a, missing),
            Err(GraphError::DanglingReference(_))
        ));

        // Wrong direction: input as the start
        let id = schema.mint_id();
        let backwards = CanvasItem::new(id, 0.0, 0.0, ItemKind::Link(Link::new(a, "In", b, "Out")));
        assert!(matches!(schema.add_item(backwards), Err(GraphError::InvalidArgument(_))));

        assert_eq!(schema.links().count(), 1);
    }

    #[test]
    fn test_batch_links_checked_against_existing_links() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");
        link(&mut schema, a, b).unwrap();

        // A fresh behaviour and a link to it arrive together
        let mut fresh = Behaviour::new("C", "Test");
        fresh
            .add_portal(PortalDirection::Input, Property::bool("In", false))
            .unwrap();
        let c = schema.mint_id();
        let to_c = schema.mint_id();
        let again = schema.mint_id();
        let batch = vec![
            CanvasItem::new(c, 0.0, 0.0, ItemKind::Behaviour(fresh)),
            CanvasItem::new(to_c, 0.0, 0.0, ItemKind::Link(Link::new(a, "Out", c, "In"))),
            CanvasItem::new(again, 0.0, 0.0, ItemKind::Link(Link::new(a, "Out", b, "In"))),
        ];

        let err = schema.add_items(batch.clone()).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert_eq!(schema.len(), 3);

        schema.add_items(batch[..2].to_vec()).unwrap();
        assert_eq!(schema.links().count(), 2);
    }

    #[test]
    fn test_non_finite_items_are_rejected() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");

        let id = schema.mint_id();
        let adrift = CanvasItem::new(id, f64::NAN, 0.0, ItemKind::Comment(Comment::default()));
        assert!(matches!(schema.add_item(adrift), Err(GraphError::InvalidArgument(_))));

        let id = schema.mint_id();
        let bent = Link::new(a, "Out", b, "In").with_points(vec![Point::new(f64::INFINITY, 0.0)]);
        let bent = CanvasItem::new(id, 0.0, 0.0, ItemKind::Link(bent));
        assert!(matches!(schema.add_item(bent), Err(GraphError::InvalidArgument(_))));

        assert!(matches!(
            schema.add_portal(a, PortalDirection::Parameter, Property::number("Gain", f64::NAN)),
            Err(GraphError::InvalidArgument(_))
        ));

        assert_eq!(schema.len(), 2);
        let tokens = schema.serialize().unwrap();
        assert_eq!(ContainerSchema::from_tokens(&tokens, &NoResources).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_cascades_and_restore_is_exact() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");
        let c = behaviour(&mut schema, "C");
        link(&mut schema, a, b).unwrap();
        link(&mut schema, b, c).unwrap();
        let before = schema.serialize().unwrap();

        let removed = schema.remove_items(&[b]).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.links().count(), 0);

        schema.restore_items(removed).unwrap();
        assert_eq!(schema.serialize().unwrap(), before);
        assert!(schema.contains(b));
    }

    #[test]
    fn test_remove_missing_item_changes_nothing() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let ghost = schema.mint_id();

        let err = schema.remove_items(&[a, ghost]).unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference(_)));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_remove_portal_cascades_links() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");
        link(&mut schema, a, b).unwrap();

        let removed = schema.remove_portal(b, "In").unwrap();
        assert_eq!(removed.links.len(), 1);
        assert_eq!(schema.links().count(), 0);
        assert!(schema.get(b).unwrap().behaviour().unwrap().portal("In").is_none());

        schema.restore_portal(removed).unwrap();
        assert_eq!(schema.links().count(), 1);
        assert_eq!(schema.get(b).unwrap().behaviour().unwrap().portals()[0].name, "In");
    }

    #[test]
    fn test_selection_tracks_live_items() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");

        schema.set_selection(&[b]).unwrap();
        assert_eq!(schema.selection(), vec![b]);
        assert_eq!(schema.selected_indices(), vec![1]);

        let ghost = schema.mint_id();
        assert!(schema.set_selection(&[a, ghost]).is_err());
        assert_eq!(schema.selection(), vec![b]);

        schema.remove_items(&[b]).unwrap();
        assert!(schema.selection().is_empty());
    }

    #[test]
    fn test_duplicates_repoint_internal_links() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");
        let c = behaviour(&mut schema, "C");
        link(&mut schema, a, b).unwrap();
        link(&mut schema, b, c).unwrap();

        let copies = schema.duplicates(&[a, b], 20.0).unwrap();
        assert_eq!(copies.len(), 3);
        let new_ids: Vec<ShallowId> = copies.iter().map(CanvasItem::id).collect();
        let copied_link = copies[2].as_link().unwrap();
        assert_eq!(copied_link.start_behaviour, new_ids[0]);
        assert_eq!(copied_link.end_behaviour, new_ids[1]);
        assert_eq!(copies[0].left, 20.0);

        schema.add_items(copies).unwrap();
        assert_eq!(schema.len(), 8);
    }

    #[test]
    fn test_load_failure_leaves_schema_untouched() {
        let mut schema = ContainerSchema::new();
        let a = behaviour(&mut schema, "A");
        let b = behaviour(&mut schema, "B");
        link(&mut schema, a, b).unwrap();
        let before = schema.serialize().unwrap();

        // Drop the second behaviour so the link dangles
        let mut broken = before.clone();
        broken.remove(1);

        let err = schema.load(&broken, &NoResources).unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference(_)));
        assert_eq!(schema.serialize().unwrap(), before);

        let reloaded = ContainerSchema::from_tokens(&before, &NoResources).unwrap();
        assert_eq!(reloaded.serialize().unwrap(), before);
    }
}
