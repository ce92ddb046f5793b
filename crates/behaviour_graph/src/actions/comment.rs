use super::behaviour::take_single;
use super::{resolve_index, ActionState};
use crate::ids::ShallowId;
use crate::items::{CanvasItem, Comment, ItemKind, DEFAULT_COMMENT_LABEL};
use crate::schema::ContainerSchema;
use crate::{GraphError, Result};

/// Place a new comment box.
#[derive(Debug, Clone)]
pub struct CommentCreated {
    left: f64,
    top: f64,
    label: String,
    state: ActionState<ShallowId, CanvasItem>,
}

impl CommentCreated {
    const NAME: &'static str = "CommentCreated";

    pub fn new(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            label: DEFAULT_COMMENT_LABEL.to_string(),
            state: ActionState::Unapplied,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
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
            None => CanvasItem::new(
                schema.mint_id(),
                self.left,
                self.top,
                ItemKind::Comment(Comment::new(self.label.clone())),
            ),
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

/// Change a comment's label.
#[derive(Debug, Clone)]
pub struct CommentEdited {
    target: ShallowId,
    label: String,
    state: ActionState<String>,
}

impl CommentEdited {
    const NAME: &'static str = "CommentEdited";

    /// `index` addresses the comment by its current position in the schema.
    pub fn new(schema: &ContainerSchema, index: i64, label: impl Into<String>) -> Result<Self> {
        let target = resolve_comment(schema, index)?;
        Ok(Self {
            target,
            label: label.into(),
            state: ActionState::Unapplied,
        })
    }

    pub fn target(&self) -> ShallowId {
        self.target
    }

    /// Label before the edit, while applied.
    pub fn previous(&self) -> Option<&str> {
        self.state.applied().map(String::as_str)
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let comment = comment_mut(schema, self.target)?;
        let previous = std::mem::replace(&mut comment.label, self.label.clone());
        self.state = ActionState::Applied(previous);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let previous = self.state.undo_memo(Self::NAME)?.clone();
        comment_mut(schema, self.target)?.label = previous;
        self.state = ActionState::Undone(());
        Ok(())
    }
}

/// Change a comment's size.
#[derive(Debug, Clone)]
pub struct CommentResized {
    target: ShallowId,
    width: f64,
    height: f64,
    state: ActionState<(f64, f64)>,
}

impl CommentResized {
    const NAME: &'static str = "CommentResized";

    pub fn new(schema: &ContainerSchema, index: i64, width: f64, height: f64) -> Result<Self> {
        for (name, value) in [("width", width), ("height", height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GraphError::invalid(format!(
                    "comment {} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let target = resolve_comment(schema, index)?;
        Ok(Self {
            target,
            width,
            height,
            state: ActionState::Unapplied,
        })
    }

    pub fn target(&self) -> ShallowId {
        self.target
    }

    /// Width and height before the resize, while applied.
    pub fn previous(&self) -> Option<(f64, f64)> {
        self.state.applied().copied()
    }

    pub fn is_applied(&self) -> bool {
        self.state.is_applied()
    }

    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        self.state.redo_memo(Self::NAME)?;
        let comment = comment_mut(schema, self.target)?;
        let previous = (comment.width, comment.height);
        comment.width = self.width;
        comment.height = self.height;
        self.state = ActionState::Applied(previous);
        Ok(())
    }

    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<()> {
        let (width, height) = *self.state.undo_memo(Self::NAME)?;
        let comment = comment_mut(schema, self.target)?;
        comment.width = width;
        comment.height = height;
        self.state = ActionState::Undone(());
        Ok(())
    }
}

fn resolve_comment(schema: &ContainerSchema, index: i64) -> Result<ShallowId> {
    let id = resolve_index(schema, index)?;
    match schema.get(id) {
        Some(item) if item.comment().is_some() => Ok(id),
        _ => Err(GraphError::invalid(format!("item at index {} is not a comment", index))),
    }
}

fn comment_mut(schema: &mut ContainerSchema, id: ShallowId) -> Result<&mut Comment> {
    schema
        .require_mut(id)?
        .comment_mut()
        .ok_or_else(|| GraphError::invalid(format!("item {} is not a comment", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{DEFAULT_COMMENT_HEIGHT, DEFAULT_COMMENT_WIDTH};

    fn schema_with_comment() -> ContainerSchema {
        let mut schema = ContainerSchema::new();
        CommentCreated::new(0.0, 0.0).redo(&mut schema).unwrap();
        schema
    }

    #[test]
    fn test_comment_defaults() {
        let schema = schema_with_comment();
        let comment = schema.items()[0].comment().unwrap();
        assert_eq!(comment.label, DEFAULT_COMMENT_LABEL);
        assert_eq!(
            (comment.width, comment.height),
            (DEFAULT_COMMENT_WIDTH, DEFAULT_COMMENT_HEIGHT)
        );
    }

    #[test]
    fn test_edit_and_restore_label() {
        let mut schema = schema_with_comment();
        let mut action = CommentEdited::new(&schema, 0, "Spawn logic").unwrap();

        action.redo(&mut schema).unwrap();
        assert_eq!(schema.items()[0].comment().unwrap().label, "Spawn logic");
        assert_eq!(action.previous(), Some("Comment"));

        action.undo(&mut schema).unwrap();
        assert_eq!(schema.items()[0].comment().unwrap().label, "Comment");
    }

    #[test]
    fn test_resize_replays() {
        let mut schema = schema_with_comment();
        let mut action = CommentResized::new(&schema, 0, 200.0, 80.0).unwrap();

        action.redo(&mut schema).unwrap();
        assert_eq!(action.previous(), Some((150.0, 50.0)));
        action.undo(&mut schema).unwrap();
        let comment = schema.items()[0].comment().unwrap();
        assert_eq!((comment.width, comment.height), (150.0, 50.0));

        action.redo(&mut schema).unwrap();
        let comment = schema.items()[0].comment().unwrap();
        assert_eq!((comment.width, comment.height), (200.0, 80.0));
    }

    #[test]
    fn test_index_must_name_a_comment() {
        let schema = schema_with_comment();
        assert!(CommentEdited::new(&schema, 1, "x").is_err());
        assert!(CommentEdited::new(&schema, -1, "x").is_err());
        assert!(CommentResized::new(&schema, 0, -5.0, 10.0).is_err());
        assert!(CommentResized::new(&schema, 0, f64::NAN, 10.0).is_err());
    }
}
