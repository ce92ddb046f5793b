//! File I/O for documents, templates and resource catalogs.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use behaviour_graph::{
    EditorSession, GraphDocument, ResourceCatalog, ResourceLookup, TemplateRegistry,
};

use crate::config::EditorConfig;

pub fn read_document(path: &Path) -> Result<GraphDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph document {}", path.display()))?;
    GraphDocument::from_json_str(&text)
        .with_context(|| format!("Failed to parse graph document {}", path.display()))
}

pub fn write_document(path: &Path, document: &GraphDocument, pretty: bool) -> Result<()> {
    let mut text = document
        .to_json_string(pretty)
        .context("Failed to serialize graph document")?;
    text.push('\n');
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write graph document {}", path.display()))?;
    info!(path = %path.display(), items = document.items.len(), "Graph document written");
    Ok(())
}

pub fn load_resources(config: &EditorConfig) -> Result<ResourceCatalog> {
    let Some(path) = &config.resources else {
        return Ok(ResourceCatalog::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resource catalog {}", path.display()))?;
    let catalog = ResourceCatalog::from_json_str(&text)
        .with_context(|| format!("Failed to parse resource catalog {}", path.display()))?;
    info!(resources = catalog.len(), "Resource catalog loaded");
    Ok(catalog)
}

pub fn load_templates(config: &EditorConfig, lookup: &dyn ResourceLookup) -> Result<TemplateRegistry> {
    let Some(path) = &config.templates else {
        return Ok(TemplateRegistry::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read templates {}", path.display()))?;
    TemplateRegistry::from_json_str(&text, lookup)
        .with_context(|| format!("Failed to parse templates {}", path.display()))
}

/// A session wired with the configured templates, resources and history limit.
pub fn open_session(config: &EditorConfig, name: &str) -> Result<EditorSession> {
    let resources = load_resources(config)?;
    let templates = load_templates(config, &resources)?;
    Ok(EditorSession::new(name)
        .with_history_limit(config.history_limit)
        .with_templates(templates)
        .with_resources(Box::new(resources)))
}
