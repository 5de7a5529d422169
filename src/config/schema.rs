//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The Rust struct representing the config file
//! - Conversion to and from a KDL document
//! - Validation

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted `quick-view-limit`.
pub const MAX_QUICK_VIEW_LIMIT: usize = 100;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// data-file "~/Sync/todos.json"
/// output-format "human"  // or "json"
/// show-completed #false
/// quick-view-limit 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoConfig {
    /// Location of the to-do file
    pub data_file: Option<PathBuf>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Whether list views include completed tasks
    pub show_completed: Option<bool>,

    /// Number of tasks shown by the quick view
    pub quick_view_limit: Option<usize>,
}

impl TodoConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.quick_view_limit {
            if limit == 0 || limit > MAX_QUICK_VIEW_LIMIT {
                return Err(format!(
                    "quick-view-limit must be 1-{}, got {}",
                    MAX_QUICK_VIEW_LIMIT, limit
                ));
            }
        }
        if let Some(ref path) = self.data_file {
            if path.as_os_str().is_empty() {
                return Err("data-file must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = first_value(doc, "data-file").and_then(|v| v.as_string()) {
            config.data_file = Some(PathBuf::from(s));
        }

        if let Some(s) = first_value(doc, "output-format").and_then(|v| v.as_string()) {
            config.output_format = OutputFormat::parse(s);
        }

        if let Some(b) = first_value(doc, "show-completed").and_then(|v| v.as_bool()) {
            config.show_completed = Some(b);
        }

        if let Some(i) = first_value(doc, "quick-view-limit").and_then(|v| v.as_integer()) {
            config.quick_view_limit = usize::try_from(i).ok();
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref path) = self.data_file {
            let mut node = KdlNode::new("data-file");
            node.push(KdlEntry::new(KdlValue::String(
                path.to_string_lossy().to_string(),
            )));
            doc.nodes_mut().push(node);
        }

        if let Some(format) = self.output_format {
            let mut node = KdlNode::new("output-format");
            node.push(KdlEntry::new(KdlValue::String(format.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        if let Some(show) = self.show_completed {
            let mut node = KdlNode::new("show-completed");
            node.push(KdlEntry::new(KdlValue::Bool(show)));
            doc.nodes_mut().push(node);
        }

        if let Some(limit) = self.quick_view_limit {
            let mut node = KdlNode::new("quick-view-limit");
            node.push(KdlEntry::new(KdlValue::Integer(limit as i128)));
            doc.nodes_mut().push(node);
        }

        doc
    }
}

fn first_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
    doc.get(name)
        .and_then(|node| node.entries().first())
        .map(|entry| entry.value())
}
