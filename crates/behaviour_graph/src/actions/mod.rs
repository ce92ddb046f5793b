//! Undoable editing actions.
//!
//! An action is built from the parameters of one user gesture. Its first `redo`
//! performs the edit and records whatever `undo` needs. Each action moves through
//! [`ActionState`]: `Unapplied -> Applied <-> Undone`. Driving it out of that order
//! fails with [`GraphError::InvalidState`] and changes nothing.

mod behaviour;
mod comment;
mod link;
mod portal;
mod selection;

pub use behaviour::*;
pub use comment::*;
pub use link::*;
pub use portal::*;
pub use selection::*;

use std::collections::HashSet;

use crate::ids::ShallowId;
use crate::schema::ContainerSchema;
use crate::{GraphError, Result};

/// Lifecycle of an action. `Applied` holds what `undo` needs, `Undone` holds what
/// a later `redo` needs to replay the same edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionState<A, U = ()> {
    Unapplied,
    Applied(A),
    Undone(U),
}

impl<A, U> ActionState<A, U> {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionState::Applied(_))
    }

    /// Memo for a redo: nothing on the first run, the undo record afterwards.
    pub(crate) fn redo_memo(&self, action: &str) -> Result<Option<&U>> {
        match self {
            ActionState::Unapplied => Ok(None),
            ActionState::Undone(memo) => Ok(Some(memo)),
            ActionState::Applied(_) => Err(GraphError::InvalidState(format!(
                "{} is already applied",
                action
            ))),
        }
    }

    pub(crate) fn undo_memo(&self, action: &str) -> Result<&A> {
        match self {
            ActionState::Applied(memo) => Ok(memo),
            ActionState::Unapplied => Err(GraphError::InvalidState(format!(
                "{} has not been applied",
                action
            ))),
            ActionState::Undone(_) => Err(GraphError::InvalidState(format!(
                "{} is already undone",
                action
            ))),
        }
    }

    pub(crate) fn applied(&self) -> Option<&A> {
        match self {
            ActionState::Applied(memo) => Some(memo),
            _ => None,
        }
    }
}

/// Resolve gesture indices to the ids of the items at those indices right now.
/// Negative, repeated and out-of-range indices are rejected.
pub(crate) fn resolve_indices(schema: &ContainerSchema, indices: &[i64]) -> Result<Vec<ShallowId>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(indices.len());

    for &index in indices {
        if index < 0 {
            return Err(GraphError::invalid(format!("{} is not a valid item index", index)));
        }
        if !seen.insert(index) {
            return Err(GraphError::invalid(format!("index {} is given more than once", index)));
        }
        let item = usize::try_from(index)
            .ok()
            .and_then(|index| schema.item_at(index))
            .ok_or_else(|| {
                GraphError::invalid(format!(
                    "index {} is out of range for {} items",
                    index,
                    schema.len()
                ))
            })?;
        ids.push(item.id());
    }

    Ok(ids)
}

pub(crate) fn resolve_index(schema: &ContainerSchema, index: i64) -> Result<ShallowId> {
    resolve_indices(schema, &[index]).map(|ids| ids[0])
}

macro_rules! editor_actions {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// Any undoable edit
        #[derive(Debug, Clone)]
        pub enum EditorAction {
            $($variant($variant),)+
        }

        impl EditorAction {
            pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
                match self {
                    $(EditorAction::$variant(action) => action.redo(schema),)+
                }
            }

            pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
                match self {
                    $(EditorAction::$variant(action) => action.undo(schema),)+
                }
            }

            pub fn is_applied(&self) -> bool {
                match self {
                    $(EditorAction::$variant(action) => action.is_applied(),)+
                }
            }

            /// Display name for undo/redo menu entries.
            pub fn label(&self) -> &'static str {
                match self {
                    $(EditorAction::$variant(_) => $label,)+
                }
            }
        }

        $(
            impl From<$variant> for EditorAction {
                fn from(action: $variant) -> Self {
                    EditorAction::$variant(action)
                }
            }
        )+
    };
}

editor_actions! {
    BehaviourCreated => "Create Behaviour",
    BehavioursRemoved => "Remove Items",
    CommentCreated => "Create Comment",
    CommentEdited => "Edit Comment",
    CommentResized => "Resize Comment",
    LinkCreated => "Create Link",
    PortalCreated => "Create Portal",
    PortalRemoved => "Remove Portal",
    PropertyChanged => "Change Property",
    SelectionChanged => "Change Selection",
    SelectionMoved => "Move Selection",
    ItemsDuplicated => "Duplicate Items",
}
