//! Data models for todods entities.
//!
//! There is a single, recursively self-similar entity:
//! - `TaskItem` - either a *list* (a container owning child items) or a
//!   *leaf* (an actual task with a completion state and optional due time)
//!
//! `TodoDocument` is the on-disk envelope around the root bucket.

pub mod timestamp;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder title for a leaf committed with an empty title.
pub const UNTITLED_TASK: &str = "Untitled task";

/// Placeholder title for a list committed with an empty title.
pub const UNTITLED_LIST: &str = "Untitled list";

/// A node of the to-do tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    /// Unique identifier, immutable after creation
    #[serde(default)]
    pub id: String,

    /// Display text
    #[serde(default)]
    pub title: String,

    /// Deadline; `None` means a standing item with no deadline
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub due_time: Option<DateTime<Utc>>,

    /// Completion state, only meaningful for leaves
    #[serde(default)]
    pub completed: bool,

    /// Creation timestamp, immutable, final sort tie-break
    #[serde(default, with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Container flag
    #[serde(default)]
    pub is_list: bool,

    /// Owned child items
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<TaskItem>,
}

impl TaskItem {
    /// Create a new item with the given ID, title and creation time.
    pub fn new(id: String, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            due_time: None,
            completed: false,
            created_at,
            is_list: false,
            children: Vec::new(),
        }
    }

    /// Whether the item carries a due time.
    pub fn has_due_time(&self) -> bool {
        self.due_time.is_some()
    }

    /// Whether the item is a leaf task.
    pub fn is_leaf(&self) -> bool {
        !self.is_list
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of items anywhere below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Completion state as it takes part in ordering and filtering.
    ///
    /// Lists never count as completed, whatever their stored flag says.
    pub fn is_done(&self) -> bool {
        !self.is_list && self.completed
    }

    /// Short due label: `list`, a local `MM-dd HH:mm` stamp, or `standing`.
    pub fn due_display(&self) -> String {
        if self.is_list {
            return "list".to_string();
        }
        match self.due_time {
            Some(due) => due.with_timezone(&Local).format("%m-%d %H:%M").to_string(),
            None => "standing".to_string(),
        }
    }

    /// Secondary line shown under the title.
    pub fn subtitle(&self) -> String {
        if self.is_list {
            let count = self.child_count();
            let noun = if count == 1 { "item" } else { "items" };
            format!("list · {} {}", count, noun)
        } else {
            self.due_display()
        }
    }
}

/// The persisted document: the root bucket wrapped in an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<TaskItem>,
}

/// Title to store for user input: trimmed, or a placeholder when blank.
pub fn commit_title(input: &str, is_list: bool) -> String {
    let trimmed = input.trim();
    if !trimmed.is_empty() {
        trimmed.to_string()
    } else if is_list {
        UNTITLED_LIST.to_string()
    } else {
        UNTITLED_TASK.to_string()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TaskItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TaskItem>>::deserialize(deserializer)?.unwrap_or_default())
}
