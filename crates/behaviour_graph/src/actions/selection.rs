use serde::{Deserialize, Serialize};

use super::{resolve_indices, ActionState};
use crate::errors::check_finite;
use crate::ids::ShallowId;
use crate::schema::ContainerSchema;
use crate::Result;

/// Replace the selection with the items at the given indices.
#[derive(Debug, Clone)]
pub struct SelectionChanged {
    targets: Vec<ShallowId>,
    state: ActionState<Vec<ShallowId>>,
}

impl SelectionChanged {
    const NAME: &'static str = "SelectionChanged";

    /// Indices are resolved against the schema now; negative or repeated indices
    /// fail here, before anything is touched.
    pub fn new(schema: &ContainerSchema, selection_ids: &[i64]) -> Result<Self> {
        Ok(Self {
            targets: resolve_indices(schema, selection_ids)?,
            state: ActionState::Unapplied,
        })
    }

    pub fn targets(&self) -> &[ShallowId] {
        &self.targets
    }

    pub fn previous(&self) -> Option<&[ShallowId]> {
        self.state.applied().map(Vec::as_slice)
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let previous = schema.selection();
        schema.set_selection(&self.targets)?;
        self.state = ActionState::Applied(previous);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let previous = self.state.undo_memo(Self::NAME)?;
        schema.set_selection(previous)?;
        self.state = ActionState::Undone(());
        Ok(())
    }
}

/// One requested move: the item at `index` goes to (`x`, `y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveTarget {
    pub index: i64,
    pub x: f64,
    pub y: f64,
}

/// Position of an item, by id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: ShallowId,
    pub x: f64,
    pub y: f64,
}

/// Move items to absolute canvas positions. Positions are not clamped.
#[derive(Debug, Clone)]
pub struct SelectionMoved {
    moves: Vec<Placement>,
    state: ActionState<Vec<Placement>>,
}

impl SelectionMoved {
    const NAME: &'static str = "SelectionMoved";

    pub fn new(schema: &ContainerSchema, targets: &[MoveTarget]) -> Result<Self> {
        let indices: Vec<i64> = targets.iter().map(|target| target.index).collect();
        let ids = resolve_indices(schema, &indices)?;
        for target in targets {
            check_finite("x", target.x)?;
            check_finite("y", target.y)?;
        }

        let moves = ids
            .into_iter()
            .zip(targets)
            .map(|(id, target)| Placement {
                id,
                x: target.x,
                y: target.y,
            })
            .collect();

        Ok(Self {
            moves,
            state: ActionState::Unapplied,
        })
    }

    /// Positions before the move, while applied.
    pub fn previous(&self) -> Option<&[Placement]> {
        self.state.applied().map(Vec::as_slice)
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let previous = snapshot(schema, &self.moves)?;
        place(schema, &self.moves);
        self.state = ActionState::Applied(previous);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let previous = self.state.undo_memo(Self::NAME)?;
        snapshot(schema, previous)?;
        place(schema, previous);
        self.state = ActionState::Undone(());
        Ok(())
    }
}

/// Current positions of the moved items; fails if any of them is gone.
fn snapshot(schema: &ContainerSchema, moves: &[Placement]) -> Result<Vec<Placement>> {
    moves
        .iter()
        .map(|placement| {
            let item = schema.require(placement.id)?;
            Ok(Placement {
                id: placement.id,
                x: item.left,
                y: item.top,
            })
        })
        .collect()
}

fn place(schema: &mut ContainerSchema, moves: &[Placement]) {
    for placement in moves {
        if let Some(item) = schema.get_mut(placement.id) {
            item.left = placement.x;
            item.top = placement.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::CommentCreated;
    use crate::GraphError;

    fn schema_with_comments(count: usize) -> ContainerSchema {
        let mut schema = ContainerSchema::new();
        for i in 0..count {
            CommentCreated::new(i as f64 * 10.0, 0.0).redo(&mut schema).unwrap();
        }
        schema
    }

    #[test]
    fn test_selection_change_and_restore() {
        let mut schema = schema_with_comments(3);
        let last = schema.items()[2].id();
        schema.set_selection(&[last]).unwrap();

        let mut action = SelectionChanged::new(&schema, &[0, 1]).unwrap();
        action.redo(&mut schema).unwrap();
        assert_eq!(schema.selected_indices(), vec![0, 1]);
        assert_eq!(action.previous().unwrap().len(), 1);

        action.undo(&mut schema).unwrap();
        assert_eq!(schema.selected_indices(), vec![2]);
    }

    #[test]
    fn test_invalid_selection_indices_fail_before_mutation() {
        let schema = schema_with_comments(2);
        assert!(matches!(
            SelectionChanged::new(&schema, &[-1]),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(matches!(
            SelectionChanged::new(&schema, &[1, 1]),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(schema.selection().is_empty());
    }

    #[test]
    fn test_move_is_unclamped_and_reversible() {
        let mut schema = schema_with_comments(1);
        let mut action =
            SelectionMoved::new(&schema, &[MoveTarget { index: 0, x: -500.0, y: 5.0 }]).unwrap();

        action.redo(&mut schema).unwrap();
        assert_eq!((schema.items()[0].left, schema.items()[0].top), (-500.0, 5.0));
        assert_eq!(action.previous().unwrap()[0].x, 0.0);

        action.undo(&mut schema).unwrap();
        assert_eq!((schema.items()[0].left, schema.items()[0].top), (0.0, 0.0));
    }

    #[test]
    fn test_move_to_non_finite_position_fails_at_construction() {
        let schema = schema_with_comments(2);
        let targets = [
            MoveTarget { index: 0, x: 3.0, y: 3.0 },
            MoveTarget { index: 1, x: f64::INFINITY, y: 0.0 },
        ];
        assert!(matches!(
            SelectionMoved::new(&schema, &targets),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(matches!(
            SelectionMoved::new(&schema, &[MoveTarget { index: 0, x: 0.0, y: f64::NAN }]),
            Err(GraphError::InvalidArgument(_))
        ));
    }
}
