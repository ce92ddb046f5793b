use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "behaviour-editor.toml";

/// Behaviour editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Undo entries kept before the oldest is dropped
    pub history_limit: usize,

    /// Behaviour template file
    pub templates: Option<PathBuf>,

    /// Resource catalog file
    pub resources: Option<PathBuf>,

    /// Canvas offset applied to duplicated items
    pub duplicate_offset: f64,

    /// Pretty-print written documents
    pub pretty: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            history_limit: behaviour_graph::DEFAULT_HISTORY_LIMIT,
            templates: None,
            resources: None,
            duplicate_offset: 20.0,
            pretty: true,
        }
    }
}

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "behaviour-editor")]
#[command(about = "Inspect, edit and create behaviour graph documents")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BEHAVIOUR_EDITOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "BEHAVIOUR_EDITOR_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "BEHAVIOUR_EDITOR_LOG_JSON", global = true)]
    pub log_json: bool,

    /// Undo history limit
    #[arg(long, env = "BEHAVIOUR_EDITOR_HISTORY_LIMIT", global = true)]
    pub history_limit: Option<usize>,

    /// Behaviour template file (JSON)
    #[arg(long, env = "BEHAVIOUR_EDITOR_TEMPLATES", global = true)]
    pub templates: Option<PathBuf>,

    /// Resource catalog file (JSON)
    #[arg(long, env = "BEHAVIOUR_EDITOR_RESOURCES", global = true)]
    pub resources: Option<PathBuf>,

    /// Offset applied to duplicated items
    #[arg(long, env = "BEHAVIOUR_EDITOR_DUPLICATE_OFFSET", global = true)]
    pub duplicate_offset: Option<f64>,

    /// Pretty-print written documents
    #[arg(long, env = "BEHAVIOUR_EDITOR_PRETTY", global = true)]
    pub pretty: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a summary of a graph document
    Inspect {
        file: PathBuf,
    },

    /// Apply a gesture script to a graph document
    Replay {
        file: PathBuf,

        /// Gesture script (JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Where to write the result; defaults to overwriting FILE
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the JSON Schema of graph documents
    Schema,

    /// Write an empty graph document
    New {
        file: PathBuf,

        /// Graph name; defaults to the file stem
        #[arg(long)]
        name: Option<String>,
    },
}

impl EditorConfig {
    /// Resolve configuration: defaults, then the config file, then CLI/env overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let path = cli.config.clone().or_else(default_config_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if cli.config.is_some() => {
                anyhow::bail!("Config file {} does not exist", path.display())
            }
            _ => Self::default(),
        };

        if let Some(log_level) = &cli.log_level {
            config.log_level = log_level.clone();
        }
        if cli.log_json {
            config.log_json = true;
        }
        if let Some(history_limit) = cli.history_limit {
            config.history_limit = history_limit;
        }
        if let Some(templates) = &cli.templates {
            config.templates = Some(templates.clone());
        }
        if let Some(resources) = &cli.resources {
            config.resources = Some(resources.clone());
        }
        if let Some(offset) = cli.duplicate_offset {
            config.duplicate_offset = offset;
        }
        if let Some(pretty) = cli.pretty {
            config.pretty = pretty;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            anyhow::bail!("history_limit must be greater than 0");
        }
        if !self.duplicate_offset.is_finite() {
            anyhow::bail!("duplicate_offset must be a finite number");
        }
        Ok(())
    }
}

/// `<platform config dir>/behaviour-editor.toml`, when a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "BehaviourGraph", "behaviour-editor")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
