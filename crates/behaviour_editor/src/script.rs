//! Gesture scripts: a JSON list of editing gestures replayed through a session.
//!
//! Items are addressed by their index in the schema at the moment the gesture runs.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use behaviour_graph::{
    BehaviourCreated, BehavioursRemoved, CommentCreated, CommentEdited, CommentResized,
    ContainerSchema, EditorAction, EditorSession, ItemsDuplicated, Link, LinkCreated,
    MoveTarget, Point, PortalCreated, PortalDirection, Property, PropertyChanged,
    PropertyToken, SelectionChanged, SelectionMoved, ShallowId, Value,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub gestures: Vec<Gesture>,
}

impl Script {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse gesture script")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Gesture {
    CreateBehaviour {
        template: String,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        left: f64,
        #[serde(default)]
        top: f64,
    },
    CreateComment {
        #[serde(default)]
        left: f64,
        #[serde(default)]
        top: f64,
        #[serde(default)]
        label: Option<String>,
    },
    CreatePortal {
        /// Behaviour to receive the portal; a standalone portal behaviour when absent
        #[serde(default)]
        behaviour: Option<i64>,
        direction: PortalDirection,
        property: PropertyToken,
        #[serde(default)]
        left: f64,
        #[serde(default)]
        top: f64,
    },
    Link {
        from: i64,
        from_portal: String,
        to: i64,
        to_portal: String,
        #[serde(default)]
        points: Vec<Point>,
    },
    Select {
        indices: Vec<i64>,
    },
    Move {
        targets: Vec<MoveTarget>,
    },
    EditComment {
        index: i64,
        label: String,
    },
    ResizeComment {
        index: i64,
        width: f64,
        height: f64,
    },
    SetProperty {
        behaviour: i64,
        portal: String,
        value: serde_json::Value,
    },
    /// Remove the given items, or the selection when no indices are given
    Remove {
        #[serde(default)]
        indices: Option<Vec<i64>>,
    },
    Duplicate {
        #[serde(default)]
        indices: Option<Vec<i64>>,
        #[serde(default)]
        offset: Option<f64>,
    },
    Undo,
    Redo,
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::CreateBehaviour { .. } => "create-behaviour",
            Gesture::CreateComment { .. } => "create-comment",
            Gesture::CreatePortal { .. } => "create-portal",
            Gesture::Link { .. } => "link",
            Gesture::Select { .. } => "select",
            Gesture::Move { .. } => "move",
            Gesture::EditComment { .. } => "edit-comment",
            Gesture::ResizeComment { .. } => "resize-comment",
            Gesture::SetProperty { .. } => "set-property",
            Gesture::Remove { .. } => "remove",
            Gesture::Duplicate { .. } => "duplicate",
            Gesture::Undo => "undo",
            Gesture::Redo => "redo",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub executed: usize,
    pub undone: usize,
    pub redone: usize,
}

/// Apply every gesture in order. Stops at the first gesture that fails; the
/// gestures before it stay applied.
pub fn replay(session: &mut EditorSession, script: &Script, duplicate_offset: f64) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();

    for (step, gesture) in script.gestures.iter().enumerate() {
        debug!(step, gesture = gesture.name(), "Replaying gesture");
        let context = || format!("Gesture {} ({}) failed", step, gesture.name());

        match gesture {
            Gesture::Undo => {
                if session.undo().with_context(context)? {
                    report.undone += 1;
                }
            }
            Gesture::Redo => {
                if session.redo().with_context(context)? {
                    report.redone += 1;
                }
            }
            _ => {
                let action = build_action(session, gesture, duplicate_offset).with_context(context)?;
                session.execute(action).with_context(context)?;
                report.executed += 1;
            }
        }
    }

    info!(
        executed = report.executed,
        undone = report.undone,
        redone = report.redone,
        "Gesture script replayed"
    );
    Ok(report)
}

fn build_action(session: &EditorSession, gesture: &Gesture, duplicate_offset: f64) -> Result<EditorAction> {
    let schema = session.schema();

    let action = match gesture {
        Gesture::CreateBehaviour {
            template,
            alias,
            left,
            top,
        } => {
            let template = session.templates().require(template)?;
            let alias = alias.clone().unwrap_or_else(|| template.name.clone());
            BehaviourCreated::new(template, alias, *left, *top)?.into()
        }
        Gesture::CreateComment { left, top, label } => {
            let action = CommentCreated::new(*left, *top);
            match label {
                Some(label) => action.with_label(label.clone()).into(),
                None => action.into(),
            }
        }
        Gesture::CreatePortal {
            behaviour,
            direction,
            property,
            left,
            top,
        } => {
            let target = behaviour.map(|index| item_id(schema, index)).transpose()?;
            let property = Property::from_token(property, session.resources())?;
            PortalCreated::new(target, *direction, property)
                .at(*left, *top)
                .into()
        }
        Gesture::Link {
            from,
            from_portal,
            to,
            to_portal,
            points,
        } => {
            let link = Link::new(
                item_id(schema, *from)?,
                from_portal.clone(),
                item_id(schema, *to)?,
                to_portal.clone(),
            )
            .with_points(points.clone());
            LinkCreated::new(link)?.into()
        }
        Gesture::Select { indices } => SelectionChanged::new(schema, indices)?.into(),
        Gesture::Move { targets } => SelectionMoved::new(schema, targets)?.into(),
        Gesture::EditComment { index, label } => {
            CommentEdited::new(schema, *index, label.clone())?.into()
        }
        Gesture::ResizeComment {
            index,
            width,
            height,
        } => CommentResized::new(schema, *index, *width, *height)?.into(),
        Gesture::SetProperty {
            behaviour,
            portal,
            value,
        } => {
            let id = item_id(schema, *behaviour)?;
            let kind = schema
                .require(id)?
                .behaviour()
                .and_then(|target| target.portal(portal))
                .map(|portal| portal.property.kind())
                .ok_or_else(|| anyhow!("Item {} has no portal '{}'", behaviour, portal))?;
            let value = Value::from_json(kind, portal, value)?;
            PropertyChanged::new(id, portal.clone(), value).into()
        }
        Gesture::Remove { indices } => {
            let targets = targets_or_selection(schema, indices.as_deref())?;
            BehavioursRemoved::new(schema, targets)?.into()
        }
        Gesture::Duplicate { indices, offset } => {
            let targets = targets_or_selection(schema, indices.as_deref())?;
            ItemsDuplicated::new(schema, targets, offset.unwrap_or(duplicate_offset))?.into()
        }
        Gesture::Undo | Gesture::Redo => {
            anyhow::bail!("{} is not an editing action", gesture.name())
        }
    };

    Ok(action)
}

fn item_id(schema: &ContainerSchema, index: i64) -> Result<ShallowId> {
    usize::try_from(index)
        .ok()
        .and_then(|index| schema.item_at(index))
        .map(|item| item.id())
        .ok_or_else(|| anyhow!("No item at index {} ({} items)", index, schema.len()))
}

fn targets_or_selection(schema: &ContainerSchema, indices: Option<&[i64]>) -> Result<Vec<ShallowId>> {
    match indices {
        Some(indices) => indices.iter().map(|index| item_id(schema, *index)).collect(),
        None => Ok(schema.selection()),
    }
}
