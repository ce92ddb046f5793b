//! Property-based tests over random editing sessions.

use proptest::collection::vec;
use proptest::prelude::*;

use behaviour_graph::{
    BehaviourCreated, BehaviourTemplate, BehavioursRemoved, CanvasItem, CommentCreated,
    CommentEdited, CommentResized, ContainerSchema, EditorAction, History, ItemToken,
    ItemsDuplicated, Link, LinkCreated, MoveTarget, NoResources, PortalCreated,
    PortalDirection, PortalRemoved, Property, PropertyChanged, SelectionChanged,
    SelectionMoved, ShallowId, Value,
};

/// One user gesture. Indices are reduced modulo whatever the schema holds at the time.
#[derive(Debug, Clone)]
enum Gesture {
    CreateBehaviour(f64, f64),
    CreateComment(f64, f64),
    Link(usize, usize),
    Select(Vec<usize>),
    Move(usize, f64, f64),
    EditComment(usize, String),
    ResizeComment(usize, f64, f64),
    Remove(usize),
    Duplicate(usize),
    AddPortal(usize),
    RemovePortal(usize),
    SetGain(usize, f64),
    StandalonePortal(f64, f64),
}

fn coordinate() -> impl Strategy<Value = f64> {
    (-2000i32..2000).prop_map(|value| value as f64 / 4.0)
}

fn gesture_strategy() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        3 => (coordinate(), coordinate()).prop_map(|(x, y)| Gesture::CreateBehaviour(x, y)),
        2 => (coordinate(), coordinate()).prop_map(|(x, y)| Gesture::CreateComment(x, y)),
        3 => (0..8usize, 0..8usize).prop_map(|(a, b)| Gesture::Link(a, b)),
        2 => vec(0..8usize, 0..4).prop_map(Gesture::Select),
        2 => (0..8usize, coordinate(), coordinate()).prop_map(|(i, x, y)| Gesture::Move(i, x, y)),
        1 => (0..8usize, "[a-z]{0,8}").prop_map(|(i, label)| Gesture::EditComment(i, label)),
        1 => (0..8usize, 1..400u32, 1..400u32)
            .prop_map(|(i, w, h)| Gesture::ResizeComment(i, w as f64, h as f64)),
        2 => (0..8usize).prop_map(Gesture::Remove),
        1 => (0..8usize).prop_map(Gesture::Duplicate),
        1 => (0..8usize).prop_map(Gesture::AddPortal),
        1 => (0..8usize).prop_map(Gesture::RemovePortal),
        1 => (0..8usize, coordinate()).prop_map(|(i, v)| Gesture::SetGain(i, v)),
        1 => (coordinate(), coordinate()).prop_map(|(x, y)| Gesture::StandalonePortal(x, y)),
    ]
}

fn relay_template() -> BehaviourTemplate {
    BehaviourTemplate::new("Relay")
        .with_portal(PortalDirection::Input, Property::bool("In", false))
        .with_portal(PortalDirection::Output, Property::bool("Out", false))
        .with_portal(PortalDirection::Parameter, Property::number("Gain", 1.0))
}

fn nth<'a, I>(mut items: I, index: usize) -> Option<&'a CanvasItem>
where
    I: Iterator<Item = &'a CanvasItem> + Clone,
{
    let len = items.clone().count();
    if len == 0 {
        return None;
    }
    items.nth(index % len)
}

fn plain_behaviours(schema: &ContainerSchema) -> impl Iterator<Item = &CanvasItem> + Clone {
    schema
        .items()
        .iter()
        .filter(|item| item.behaviour().is_some_and(|b| b.behaviour_type == "Relay"))
}

fn comment_indices(schema: &ContainerSchema) -> Vec<i64> {
    schema
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| item.comment().is_some())
        .map(|(index, _)| index as i64)
        .collect()
}

/// Build the action for a gesture against the current schema, if the gesture
/// makes sense right now.
fn action_for(gesture: &Gesture, schema: &ContainerSchema, serial: usize) -> Option<EditorAction> {
    let len = schema.len();
    let action: EditorAction = match gesture {
        Gesture::CreateBehaviour(x, y) => {
            BehaviourCreated::new(&relay_template(), format!("B{}", serial), *x, *y)
                .ok()?
                .into()
        }
        Gesture::CreateComment(x, y) => CommentCreated::new(*x, *y).into(),
        Gesture::Link(a, b) => {
            let start = nth(plain_behaviours(schema), *a)?.id();
            let end = nth(plain_behaviours(schema), *b)?.id();
            LinkCreated::new(Link::new(start, "Out", end, "In")).ok()?.into()
        }
        Gesture::Select(indices) if len > 0 => {
            let mut indices: Vec<i64> = indices.iter().map(|i| (i % len) as i64).collect();
            indices.sort_unstable();
            indices.dedup();
            SelectionChanged::new(schema, &indices).ok()?.into()
        }
        Gesture::Move(i, x, y) if len > 0 => {
            let target = MoveTarget {
                index: (i % len) as i64,
                x: *x,
                y: *y,
            };
            SelectionMoved::new(schema, &[target]).ok()?.into()
        }
        Gesture::EditComment(i, label) => {
            let comments = comment_indices(schema);
            let index = *comments.get(i % comments.len().max(1))?;
            CommentEdited::new(schema, index, label.clone()).ok()?.into()
        }
        Gesture::ResizeComment(i, w, h) => {
            let comments = comment_indices(schema);
            let index = *comments.get(i % comments.len().max(1))?;
            CommentResized::new(schema, index, *w, *h).ok()?.into()
        }
        Gesture::Remove(i) if len > 0 => {
            let id = schema.items()[i % len].id();
            BehavioursRemoved::new(schema, vec![id]).ok()?.into()
        }
        Gesture::Duplicate(i) if len > 0 => {
            let id = schema.items()[i % len].id();
            ItemsDuplicated::new(schema, vec![id], 20.0).ok()?.into()
        }
        Gesture::AddPortal(i) => {
            let id = nth(plain_behaviours(schema), *i)?.id();
            PortalCreated::new(
                Some(id),
                PortalDirection::Input,
                Property::text(format!("Extra{}", serial), "x"),
            )
            .into()
        }
        Gesture::RemovePortal(i) => {
            let id = nth(plain_behaviours(schema), *i)?.id();
            PortalRemoved::new(schema, id, "In").ok()?.into()
        }
        Gesture::SetGain(i, value) => {
            let id = nth(plain_behaviours(schema), *i)?.id();
            PropertyChanged::new(id, "Gain", Value::Number(*value)).into()
        }
        Gesture::StandalonePortal(x, y) => PortalCreated::new(
            None,
            PortalDirection::Output,
            Property::bool(format!("Edge{}", serial), false),
        )
        .at(*x, *y)
        .into(),
        _ => return None,
    };
    Some(action)
}

/// Play gestures through a history. Gestures that do not apply are skipped.
fn play(gestures: &[Gesture], schema: &mut ContainerSchema, history: &mut History) {
    for (serial, gesture) in gestures.iter().enumerate() {
        if let Some(action) = action_for(gesture, schema, serial) {
            let _ = history.execute(action, schema);
        }
    }
}

fn links_are_live(schema: &ContainerSchema) -> bool {
    schema.links().all(|(_, link)| {
        [
            (link.start_behaviour, &link.start_portal),
            (link.end_behaviour, &link.end_portal),
        ]
        .iter()
        .all(|(id, portal)| {
            schema
                .get(*id)
                .and_then(|item| item.behaviour())
                .is_some_and(|behaviour| behaviour.portal(portal).is_some())
        })
    })
}

fn snapshot(schema: &ContainerSchema) -> Vec<ItemToken> {
    schema.serialize().expect("live schema serializes")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_undo_in_reverse_restores_schema(
        setup in vec(gesture_strategy(), 0..12),
        gestures in vec(gesture_strategy(), 1..30),
    ) {
        let mut schema = ContainerSchema::new();
        let mut history = History::new(1000);
        play(&setup, &mut schema, &mut history);
        let before = snapshot(&schema);
        let depth = history.undo_depth();

        play(&gestures, &mut schema, &mut history);
        prop_assert!(links_are_live(&schema));

        while history.undo_depth() > depth {
            prop_assert!(history.undo(&mut schema).unwrap());
        }
        prop_assert_eq!(snapshot(&schema), before);
    }

    #[test]
    fn prop_redo_after_undo_reaches_same_state(gestures in vec(gesture_strategy(), 1..30)) {
        let mut schema = ContainerSchema::new();
        let mut history = History::new(1000);
        play(&gestures, &mut schema, &mut history);
        let after = snapshot(&schema);

        while history.undo(&mut schema).unwrap() {}
        prop_assert!(schema.is_empty());
        while history.redo(&mut schema).unwrap() {}
        prop_assert_eq!(snapshot(&schema), after);
    }

    #[test]
    fn prop_token_round_trip_is_identity(gestures in vec(gesture_strategy(), 0..30)) {
        let mut schema = ContainerSchema::new();
        let mut history = History::new(1000);
        play(&gestures, &mut schema, &mut history);

        let tokens = snapshot(&schema);
        let json = serde_json::to_string(&tokens).unwrap();
        let parsed: Vec<ItemToken> = serde_json::from_str(&json).unwrap();
        let restored = ContainerSchema::from_tokens(&parsed, &NoResources).unwrap();

        prop_assert_eq!(snapshot(&restored), tokens);
    }

    #[test]
    fn prop_removing_a_behaviour_leaves_no_dangling_links(
        gestures in vec(gesture_strategy(), 1..30),
        pick in 0..8usize,
    ) {
        let mut schema = ContainerSchema::new();
        let mut history = History::new(1000);
        play(&gestures, &mut schema, &mut history);

        let behaviours: Vec<ShallowId> = schema.behaviours().map(CanvasItem::id).collect();
        prop_assume!(!behaviours.is_empty());
        let target = behaviours[pick % behaviours.len()];

        history
            .execute(BehavioursRemoved::new(&schema, vec![target]).unwrap(), &mut schema)
            .unwrap();
        prop_assert!(!schema.contains(target));
        prop_assert!(schema.links().all(|(_, link)| !link.touches(target)));
        prop_assert!(links_are_live(&schema));
    }
}
