//! Command implementations for the todods CLI.
//!
//! Each command talks to a [`TodoStore`] only through its public operations
//! and returns a result that can be rendered as JSON or as human text.
//! Edits follow one pattern: look the item up, clone it, change the clone,
//! hand it to [`TodoStore::update`].

use crate::config::{ResolvedConfig, TodoConfig, write_config};
use crate::due::parse_due_arg;
use crate::models::TaskItem;
use crate::storage::TodoStore;
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Flat view of an item as commands report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    pub is_list: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub child_count: usize,
    pub subtitle: String,
}

impl From<&TaskItem> for ItemSummary {
    fn from(item: &TaskItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            is_list: item.is_list,
            completed: item.is_done(),
            due_time: item.due_time,
            created_at: item.created_at,
            child_count: item.child_count(),
            subtitle: item.subtitle(),
        }
    }
}

impl ItemSummary {
    /// One-line rendering: checkbox or list marker, title, subtitle, id.
    fn line(&self) -> String {
        let marker = if self.is_list {
            "▸"
        } else if self.completed {
            "[x]"
        } else {
            "[ ]"
        };
        format!("{} {}  ({})  #{}", marker, self.title, self.subtitle, self.id)
    }
}

/// Resolve the `--list` argument of the add commands to a list id.
///
/// A list id is used as-is. A task id means "next to that task": its parent
/// list, or the top level for a top-level task.
fn target_list(store: &TodoStore, selected: Option<&str>) -> Result<Option<String>> {
    let Some(id) = selected else {
        return Ok(None);
    };
    let item = store
        .find_by_id(id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    if item.is_list {
        return Ok(Some(item.id.clone()));
    }
    Ok(store.find_parent(id).map(|parent| parent.id.clone()))
}

fn require<'a>(store: &'a TodoStore, id: &str) -> Result<&'a TaskItem> {
    store
        .find_by_id(id)
        .ok_or_else(|| Error::NotFound(id.to_string()))
}

fn require_leaf<'a>(store: &'a TodoStore, id: &str) -> Result<&'a TaskItem> {
    let item = require(store, id)?;
    if !item.is_leaf() {
        return Err(Error::InvalidInput(format!(
            "{} is a list; only tasks have a due time or completion state",
            id
        )));
    }
    Ok(item)
}

// === add / add-list ===

#[derive(Serialize)]
pub struct ItemAdded {
    pub item: ItemSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
}

impl CommandResult for ItemAdded {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let kind = if self.item.is_list { "list" } else { "task" };
        match self.list {
            Some(ref list) => format!(
                "Added {} {} \"{}\" to list {}",
                kind, self.item.id, self.item.title, list
            ),
            None => format!("Added {} {} \"{}\"", kind, self.item.id, self.item.title),
        }
    }
}

/// Add a task, optionally due at `due` (see [`parse_due_arg`]).
pub fn add_task(
    store: &mut TodoStore,
    title: &str,
    due: Option<&str>,
    list: Option<&str>,
) -> Result<ItemAdded> {
    let due_time = match due {
        Some(input) => parse_due_arg(input)?,
        None => None,
    };
    let parent = target_list(store, list)?;
    let item = store.add(title, due_time, parent.as_deref(), false)?;
    Ok(ItemAdded {
        item: ItemSummary::from(&item),
        list: parent,
    })
}

/// Add a list.
pub fn add_list(store: &mut TodoStore, title: &str, list: Option<&str>) -> Result<ItemAdded> {
    let parent = target_list(store, list)?;
    let item = store.add(title, None, parent.as_deref(), true)?;
    Ok(ItemAdded {
        item: ItemSummary::from(&item),
        list: parent,
    })
}

// === list ===

#[derive(Serialize)]
pub struct ListView {
    /// The list being shown; absent for the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ItemSummary>,
    /// Where "back" leads: the enclosing list, absent for the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub items: Vec<ItemSummary>,
}

impl CommandResult for ListView {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        match self.list {
            Some(ref list) => {
                let _ = writeln!(out, "{} ({})", list.title, list.subtitle);
                let back = self.parent.as_deref().unwrap_or("top level");
                let _ = writeln!(out, "  back: {}", back);
            }
            None => {
                let _ = writeln!(out, "TODO");
            }
        }
        if self.items.is_empty() {
            out.push_str("  (empty)");
        } else {
            let lines: Vec<String> = self
                .items
                .iter()
                .map(|item| format!("  {}", item.line()))
                .collect();
            out.push_str(&lines.join("\n"));
        }
        out
    }
}

/// Show the direct items of one list, or of the top level.
pub fn list(store: &TodoStore, list: Option<&str>, include_completed: bool) -> Result<ListView> {
    let (header, parent) = match list {
        None => (None, None),
        Some(id) => {
            let item = require(store, id)?;
            if !item.is_list {
                return Err(Error::NotAList(id.to_string()));
            }
            let parent = store.find_parent(id).map(|p| p.id.clone());
            (Some(ItemSummary::from(item)), parent)
        }
    };

    let items = store
        .get_sorted(list, include_completed)
        .into_iter()
        .map(ItemSummary::from)
        .collect();

    Ok(ListView {
        list: header,
        parent,
        items,
    })
}

// === tree ===

#[derive(Debug, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub item: ItemSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

#[derive(Serialize)]
pub struct TreeView {
    pub items: Vec<TreeNode>,
}

impl CommandResult for TreeView {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.items.is_empty() {
            return "No items. Add one with `todo add <title>`.".to_string();
        }
        let mut lines = Vec::new();
        render_tree(&self.items, 0, &mut lines);
        lines.join("\n")
    }
}

fn render_tree(nodes: &[TreeNode], depth: usize, lines: &mut Vec<String>) {
    for node in nodes {
        lines.push(format!("{}{}", "  ".repeat(depth), node.item.line()));
        render_tree(&node.children, depth + 1, lines);
    }
}

/// Show the whole tree in store order.
pub fn tree(store: &TodoStore, include_completed: bool) -> TreeView {
    TreeView {
        items: tree_nodes(store, None, include_completed),
    }
}

fn tree_nodes(store: &TodoStore, parent: Option<&str>, include_completed: bool) -> Vec<TreeNode> {
    store
        .get_sorted(parent, include_completed)
        .into_iter()
        .map(|item| TreeNode {
            item: ItemSummary::from(item),
            children: if item.is_list {
                tree_nodes(store, Some(item.id.as_str()), include_completed)
            } else {
                Vec::new()
            },
        })
        .collect()
}

// === quick ===

#[derive(Serialize)]
pub struct QuickView {
    pub items: Vec<ItemSummary>,
    /// Open tasks in total, including those past the limit
    pub open: usize,
}

impl CommandResult for QuickView {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.items.is_empty() {
            return "Nothing to do.".to_string();
        }
        let mut lines: Vec<String> = self.items.iter().map(|item| item.line()).collect();
        if self.open > self.items.len() {
            lines.push(format!("... and {} more", self.open - self.items.len()));
        }
        lines.join("\n")
    }
}

/// The first `limit` open tasks across all lists.
pub fn quick(store: &TodoStore, limit: usize) -> QuickView {
    let open = store.get_flattened_todos(false);
    QuickView {
        open: open.len(),
        items: open.into_iter().take(limit).map(ItemSummary::from).collect(),
    }
}

// === show ===

#[derive(Serialize)]
pub struct ShowResult {
    pub item: ItemSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemSummary>,
}

impl CommandResult for ShowResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let item = &self.item;
        let mut out = String::new();
        let _ = writeln!(out, "{}  #{}", item.title, item.id);
        let kind = if item.is_list { "list" } else { "task" };
        let _ = writeln!(out, "  kind:    {}", kind);
        if !item.is_list {
            let state = if item.completed { "completed" } else { "open" };
            let _ = writeln!(out, "  state:   {}", state);
            let due = item
                .due_time
                .map(|due| due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "none".to_string());
            let _ = writeln!(out, "  due:     {}", due);
        }
        let _ = writeln!(
            out,
            "  created: {}",
            item.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
        let _ = write!(out, "  in:      {}", self.parent.as_deref().unwrap_or("top level"));
        for child in &self.children {
            let _ = write!(out, "\n    {}", child.line());
        }
        out
    }
}

/// Show one item with its location and, for lists, its items.
pub fn show(store: &TodoStore, id: &str) -> Result<ShowResult> {
    let item = require(store, id)?;
    let children = if item.is_list {
        store
            .get_sorted(Some(id), true)
            .into_iter()
            .map(ItemSummary::from)
            .collect()
    } else {
        Vec::new()
    };
    Ok(ShowResult {
        item: ItemSummary::from(item),
        parent: store.find_parent(id).map(|p| p.id.clone()),
        children,
    })
}

// === rename / due / done / undone ===

#[derive(Serialize)]
pub struct ItemUpdated {
    pub item: ItemSummary,
}

impl CommandResult for ItemUpdated {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Updated {}", self.item.line())
    }
}

fn apply(store: &mut TodoStore, edited: TaskItem) -> Result<ItemUpdated> {
    store.update(&edited)?;
    let item = require(store, &edited.id)?;
    Ok(ItemUpdated {
        item: ItemSummary::from(item),
    })
}

/// Change an item's title.
pub fn rename(store: &mut TodoStore, id: &str, title: &str) -> Result<ItemUpdated> {
    let mut edited = require(store, id)?.clone();
    edited.title = title.to_string();
    apply(store, edited)
}

/// Set (or with `none`, clear) a task's due time.
pub fn set_due(store: &mut TodoStore, id: &str, when: &str) -> Result<ItemUpdated> {
    let due_time = parse_due_arg(when)?;
    let mut edited = require_leaf(store, id)?.clone();
    edited.due_time = due_time;
    apply(store, edited)
}

/// Mark a task completed or open again.
pub fn set_completed(store: &mut TodoStore, id: &str, completed: bool) -> Result<ItemUpdated> {
    let mut edited = require_leaf(store, id)?.clone();
    edited.completed = completed;
    apply(store, edited)
}

// === delete ===

#[derive(Serialize)]
pub struct ItemDeleted {
    pub id: String,
    pub title: String,
    /// Items removed along with it
    pub descendants: usize,
}

impl CommandResult for ItemDeleted {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.descendants == 0 {
            format!("Deleted {} \"{}\"", self.id, self.title)
        } else {
            format!(
                "Deleted {} \"{}\" and {} item(s) in it",
                self.id, self.title, self.descendants
            )
        }
    }
}

/// Delete an item. Lists that still hold items need `force`.
pub fn delete(store: &mut TodoStore, id: &str, force: bool) -> Result<ItemDeleted> {
    let item = require(store, id)?;
    let descendants = item.descendant_count();
    if item.is_list && descendants > 0 && !force {
        return Err(Error::InvalidInput(format!(
            "List {} still holds {} item(s); pass --force to delete them too",
            id, descendants
        )));
    }
    let result = ItemDeleted {
        id: item.id.clone(),
        title: item.title.clone(),
        descendants,
    };
    store.delete(id)?;
    Ok(result)
}

// === path / config ===

#[derive(Serialize)]
pub struct PathsResult {
    pub data_file: PathBuf,
    pub data_file_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub config_file_exists: bool,
}

impl CommandResult for PathsResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mark = |exists: bool| if exists { "" } else { " (missing)" };
        let config = match self.config_file {
            Some(ref path) => format!("{}{}", path.display(), mark(self.config_file_exists)),
            None => "unavailable".to_string(),
        };
        format!(
            "data:   {}{}\nconfig: {}",
            self.data_file.display(),
            mark(self.data_file_exists),
            config
        )
    }
}

/// Report where data and config live.
pub fn paths(resolved: &ResolvedConfig, config_path: Option<&Path>) -> PathsResult {
    PathsResult {
        data_file: resolved.data_file().to_path_buf(),
        data_file_exists: resolved.data_file().exists(),
        config_file: config_path.map(Path::to_path_buf),
        config_file_exists: config_path.is_some_and(Path::exists),
    }
}

#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigShowResult {
    pub settings: Vec<ConfigEntry>,
}

impl CommandResult for ConfigShowResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        self.settings
            .iter()
            .map(|entry| format!("{:<17} {}  [{}]", entry.key, entry.value, entry.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Show every resolved setting with its source.
pub fn config_show(resolved: &ResolvedConfig) -> ConfigShowResult {
    let entry = |key, value: String, source: &crate::config::ValueSource| ConfigEntry {
        key,
        value,
        source: source.to_string(),
    };
    ConfigShowResult {
        settings: vec![
            entry(
                "data-file",
                resolved.data_file().display().to_string(),
                &resolved.data_file.source,
            ),
            entry(
                "output-format",
                resolved.output_format().to_string(),
                &resolved.output_format.source,
            ),
            entry(
                "show-completed",
                resolved.show_completed().to_string(),
                &resolved.show_completed.source,
            ),
            entry(
                "quick-view-limit",
                resolved.quick_view_limit().to_string(),
                &resolved.quick_view_limit.source,
            ),
        ],
    }
}

#[derive(Serialize)]
pub struct ConfigInitResult {
    pub path: PathBuf,
    pub created: bool,
}

impl CommandResult for ConfigInitResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.created {
            format!("Wrote {}", self.path.display())
        } else {
            format!("{} already exists; left unchanged", self.path.display())
        }
    }
}

/// Write a config.kdl holding the effective settings, unless one exists.
pub fn config_init(path: &Path, resolved: &ResolvedConfig) -> Result<ConfigInitResult> {
    if path.exists() {
        return Ok(ConfigInitResult {
            path: path.to_path_buf(),
            created: false,
        });
    }

    let config = TodoConfig {
        data_file: Some(resolved.data_file().to_path_buf()),
        output_format: Some(resolved.output_format()),
        show_completed: Some(resolved.show_completed()),
        quick_view_limit: Some(resolved.quick_view_limit()),
    };
    write_config(path, &config)?;
    Ok(ConfigInitResult {
        path: path.to_path_buf(),
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use chrono::Duration;

    fn titles(items: &[ItemSummary]) -> Vec<&str> {
        items.iter().map(|item| item.title.as_str()).collect()
    }

    #[test]
    fn test_add_next_to_selected_task() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        let report = add_task(&mut store, "Report", None, Some(work.id.as_str())).unwrap();
        assert_eq!(report.list.as_deref(), Some(work.id.as_str()));

        let sibling = add_task(&mut store, "Slides", None, Some(report.item.id.as_str())).unwrap();
        assert_eq!(sibling.list.as_deref(), Some(work.id.as_str()));

        let top = add_task(&mut store, "Top", None, None).unwrap();
        let next_to_top = add_task(&mut store, "Also top", None, Some(top.item.id.as_str())).unwrap();
        assert_eq!(next_to_top.list, None);
        assert!(store.find_parent(&next_to_top.item.id).is_none());
    }

    #[test]
    fn test_add_rejects_bad_due_and_unknown_list() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        assert!(matches!(
            add_task(&mut store, "x", Some("someday"), None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            add_task(&mut store, "x", None, Some("missing")),
            Err(Error::NotFound(_))
        ));
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_list_view_with_back_pointer() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        let sub = add_list(&mut store, "Q3", Some(work.id.as_str())).unwrap().item;
        env.clock.advance(Duration::seconds(1));
        add_task(&mut store, "Plan", None, Some(sub.id.as_str())).unwrap();

        let view = list(&store, Some(sub.id.as_str()), true).unwrap();
        assert_eq!(view.parent.as_deref(), Some(work.id.as_str()));
        assert_eq!(titles(&view.items), vec!["Plan"]);

        let top = list(&store, None, true).unwrap();
        assert!(top.list.is_none());
        assert_eq!(titles(&top.items), vec!["Work"]);
        assert!(top.to_human().starts_with("TODO"));
    }

    #[test]
    fn test_list_of_task_is_an_error() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let task = add_task(&mut store, "Plan", None, None).unwrap().item;
        assert!(matches!(list(&store, Some(task.id.as_str()), true), Err(Error::NotAList(_))));
    }

    #[test]
    fn test_done_and_undone() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let task = add_task(&mut store, "Plan", None, None).unwrap().item;

        assert!(set_completed(&mut store, &task.id, true).unwrap().item.completed);
        assert!(list(&store, None, false).unwrap().items.is_empty());
        assert!(!set_completed(&mut store, &task.id, false).unwrap().item.completed);
    }

    #[test]
    fn test_lists_reject_due_and_completion() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        assert!(matches!(
            set_completed(&mut store, &work.id, true),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            set_due(&mut store, &work.id, "2024-05-02"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_set_and_clear_due() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let task = add_task(&mut store, "Plan", None, None).unwrap().item;

        let dated = set_due(&mut store, &task.id, "2024-05-02T09:00:00Z").unwrap();
        assert!(dated.item.due_time.is_some());
        let cleared = set_due(&mut store, &task.id, "none").unwrap();
        assert!(cleared.item.due_time.is_none());
        assert_eq!(cleared.item.subtitle, "standing");
    }

    #[test]
    fn test_rename_blank_uses_placeholder() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        let renamed = rename(&mut store, &work.id, "   ").unwrap();
        assert_eq!(renamed.item.title, crate::models::UNTITLED_LIST);
    }

    #[test]
    fn test_delete_non_empty_list_needs_force() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        add_task(&mut store, "Plan", None, Some(work.id.as_str())).unwrap();

        assert!(matches!(
            delete(&mut store, &work.id, false),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.find_by_id(&work.id).is_some());

        let deleted = delete(&mut store, &work.id, true).unwrap();
        assert_eq!(deleted.descendants, 1);
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        assert!(matches!(delete(&mut store, "nope", true), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_quick_view_limit() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        for i in 0..5 {
            env.clock.advance(Duration::seconds(1));
            add_task(&mut store, &format!("task {}", i), None, Some(work.id.as_str())).unwrap();
        }

        let view = quick(&store, 3);
        assert_eq!(view.open, 5);
        assert_eq!(titles(&view.items), vec!["task 0", "task 1", "task 2"]);
        assert!(view.to_human().ends_with("... and 2 more"));
    }

    #[test]
    fn test_tree_nests_children() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        add_task(&mut store, "Plan", None, Some(work.id.as_str())).unwrap();

        let view = tree(&store, true);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].children[0].item.title, "Plan");

        let json = view.to_json();
        assert!(json.contains("\"title\":\"Work\""));
        assert!(json.contains("\"children\":[{"));

        let human = view.to_human();
        assert!(human.contains("▸ Work"));
        assert!(human.contains("\n  [ ] Plan"));
    }

    #[test]
    fn test_show_reports_parent_and_children() {
        let env = TestEnv::new();
        let mut store = env.open_store();
        let work = add_list(&mut store, "Work", None).unwrap().item;
        let plan = add_task(&mut store, "Plan", None, Some(work.id.as_str())).unwrap().item;

        let list_view = show(&store, &work.id).unwrap();
        assert_eq!(list_view.children.len(), 1);
        assert!(list_view.parent.is_none());

        let task_view = show(&store, &plan.id).unwrap();
        assert_eq!(task_view.parent.as_deref(), Some(work.id.as_str()));
        assert!(task_view.to_human().contains("state:   open"));
    }
}
