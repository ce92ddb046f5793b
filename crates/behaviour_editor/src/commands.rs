//! Subcommand bodies, kept out of `main` so they can be driven from tests.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use behaviour_graph::GraphDocument;

use crate::config::EditorConfig;
use crate::inspect::{self, Summary};
use crate::io;
use crate::script::{self, ReplayReport, Script};

pub fn inspect(config: &EditorConfig, file: &Path) -> Result<Summary> {
    let document = io::read_document(file)?;
    let session_name = document.metadata.name.clone();
    let mut session = io::open_session(config, &session_name)?;
    session
        .load(document.clone())
        .with_context(|| format!("Invalid graph document {}", file.display()))?;
    Ok(inspect::summarize(&document, session.schema()))
}

pub fn replay(
    config: &EditorConfig,
    file: &Path,
    script_path: &Path,
    out: Option<&Path>,
) -> Result<ReplayReport> {
    let document = io::read_document(file)?;
    let mut session = io::open_session(config, &document.metadata.name)?;
    session
        .load(document)
        .with_context(|| format!("Invalid graph document {}", file.display()))?;

    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read gesture script {}", script_path.display()))?;
    let script = Script::from_json_str(&text)?;

    let report = script::replay(&mut session, &script, config.duplicate_offset)?;
    if !session.is_dirty() {
        info!("Gesture script left the graph unchanged");
    }
    let document = session.save()?;
    io::write_document(out.unwrap_or(file), &document, config.pretty)?;
    Ok(report)
}

pub fn new_document(config: &EditorConfig, file: &Path, name: Option<&str>) -> Result<GraphDocument> {
    if file.exists() {
        anyhow::bail!("{} already exists", file.display());
    }
    let name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string()),
    };
    let document = GraphDocument::new(name);
    io::write_document(file, &document, config.pretty)?;
    Ok(document)
}

pub fn json_schema() -> Result<String> {
    serde_json::to_string_pretty(&GraphDocument::json_schema())
        .context("Failed to serialize document schema")
}
