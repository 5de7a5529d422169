//! Reading and writing the to-do JSON file.
//!
//! The file holds one document, `{ "items": [...] }`, and is always
//! replaced wholesale: the new content goes to a temporary file in the
//! destination directory which is then renamed over the old one.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::models::{TaskItem, TodoDocument};
use crate::Result;

/// Canonical spelling of every field the document format knows.
const FIELD_NAMES: &[&str] = &[
    "items",
    "id",
    "title",
    "dueTime",
    "completed",
    "createdAt",
    "isList",
    "children",
];

/// Read the root bucket from `path`.
///
/// A missing file is an empty tree. Any other failure is returned to the
/// caller, which decides whether to absorb it.
pub fn read_document(path: &Path) -> Result<Vec<TaskItem>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    parse_document(&content)
}

/// Parse document text, matching field names case-insensitively.
pub fn parse_document(content: &str) -> Result<Vec<TaskItem>> {
    let mut value: Value = serde_json::from_str(content)?;
    canonicalize_keys(&mut value);
    let document: TodoDocument = serde_json::from_value(value)?;
    Ok(document.items)
}

/// Replace the file at `path` with the given root bucket.
pub fn write_document(path: &Path, items: &[TaskItem]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let document = DocumentRef { items };
    let json = serde_json::to_string_pretty(&document)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(json.as_bytes())?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

#[derive(serde::Serialize)]
struct DocumentRef<'a> {
    items: &'a [TaskItem],
}

/// Rewrite object keys that match a known field name in any letter case.
fn canonicalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let entries = std::mem::take(map);
            let mut canonical = Map::with_capacity(entries.len());
            for (key, mut child) in entries {
                canonicalize_keys(&mut child);
                let key = FIELD_NAMES
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(&key))
                    .map(|name| name.to_string())
                    .unwrap_or(key);
                canonical.insert(key, child);
            }
            *map = canonical;
        }
        Value::Array(values) => values.iter_mut().for_each(canonicalize_keys),
        _ => {}
    }
}
