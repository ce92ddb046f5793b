//! Editor session: one schema, its history and the services editing needs.

use tracing::{debug, info};

use crate::actions::EditorAction;
use crate::document::{GraphDocument, GraphMetadata};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::resources::{NoResources, ResourceLookup};
use crate::schema::ContainerSchema;
use crate::template::TemplateRegistry;
use crate::Result;

/// Notification sent to subscribers after the session changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Executed { label: &'static str },
    Undone { label: &'static str },
    Redone { label: &'static str },
    Loaded { items: usize },
    Saved { items: usize },
}

pub type SessionEventSender = flume::Sender<SessionEvent>;
pub type SessionEventReceiver = flume::Receiver<SessionEvent>;

pub struct EditorSession {
    schema: ContainerSchema,
    history: History,
    templates: TemplateRegistry,
    resources: Box<dyn ResourceLookup>,
    metadata: GraphMetadata,
    saved_revision: u64,
    subscribers: Vec<SessionEventSender>,
}

impl EditorSession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: ContainerSchema::new(),
            history: History::new(DEFAULT_HISTORY_LIMIT),
            templates: TemplateRegistry::new(),
            resources: Box::new(NoResources),
            metadata: GraphMetadata::new(name),
            saved_revision: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = History::new(limit);
        self.saved_revision = self.history.revision();
        self
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_resources(mut self, resources: Box<dyn ResourceLookup>) -> Self {
        self.resources = resources;
        self
    }

    pub fn schema(&self) -> &ContainerSchema {
        &self.schema
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn resources(&self) -> &dyn ResourceLookup {
        self.resources.as_ref()
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut GraphMetadata {
        &mut self.metadata
    }

    /// Receiver for session events. Dropped receivers are pruned on the next send.
    pub fn subscribe(&mut self) -> SessionEventReceiver {
        let (sender, receiver) = flume::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn execute(&mut self, action: impl Into<EditorAction>) -> Result<()> {
        let action = action.into();
        let label = action.label();
        self.history.execute(action, &mut self.schema)?;
        self.metadata.touch();
        self.emit(SessionEvent::Executed { label });
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool> {
        let label = self.history.undo_label();
        let undone = self.history.undo(&mut self.schema)?;
        if let (true, Some(label)) = (undone, label) {
            self.metadata.touch();
            self.emit(SessionEvent::Undone { label });
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let label = self.history.redo_label();
        let redone = self.history.redo(&mut self.schema)?;
        if let (true, Some(label)) = (redone, label) {
            self.metadata.touch();
            self.emit(SessionEvent::Redone { label });
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_label(&self) -> Option<&'static str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.history.redo_label()
    }

    /// True when the schema differs from the last save or load.
    pub fn is_dirty(&self) -> bool {
        self.history.revision() != self.saved_revision
    }

    pub fn mark_saved(&mut self) {
        self.saved_revision = self.history.revision();
    }

    /// Snapshot the session as a document and mark it saved.
    pub fn save(&mut self) -> Result<GraphDocument> {
        let document = GraphDocument::capture(self.metadata.clone(), &self.schema)?;
        self.mark_saved();
        info!(name = %self.metadata.name, items = document.items.len(), "Graph saved");
        self.emit(SessionEvent::Saved {
            items: document.items.len(),
        });
        Ok(document)
    }

    /// Replace the session contents with a document. History starts over. On error
    /// the session is unchanged.
    pub fn load(&mut self, document: GraphDocument) -> Result<()> {
        let schema = document.to_schema(self.resources.as_ref())?;
        let items = schema.len();

        self.schema = schema;
        self.metadata = document.metadata;
        self.history.clear();
        self.mark_saved();

        info!(name = %self.metadata.name, items, "Graph loaded");
        self.emit(SessionEvent::Loaded { items });
        Ok(())
    }

    fn emit(&mut self, event: SessionEvent) {
        debug!(?event, subscribers = self.subscribers.len(), "Session event");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
