//! Storage layer for todods data.
//!
//! `TodoStore` owns the whole to-do tree. It is the single source of truth
//! for item order: after every mutation the tree is re-sorted, the file is
//! rewritten, and subscribed observers are told to re-query.
//!
//! ## Layout
//!
//! - `clock` - injectable time source and id sequence
//! - `normalize` - repair pass applied to freshly loaded data
//! - `order` - the bucket comparator and tree sort
//! - `file` - reading and atomically replacing the JSON file

pub mod clock;
pub mod file;
pub mod normalize;
pub mod order;

pub use clock::{Clock, IdSequence, ManualClock, SystemClock};
pub use normalize::normalize;

use crate::models::{TaskItem, commit_title};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TODODS_DATA_DIR";

/// File name of the to-do document inside the data directory.
pub const DATA_FILE_NAME: &str = "todos.json";

/// Handle returned by [`TodoStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The in-memory to-do tree backed by a JSON file.
pub struct TodoStore {
    path: PathBuf,
    items: Vec<TaskItem>,
    last_loaded: Vec<TaskItem>,
    listeners: Vec<(ListenerId, Box<dyn FnMut()>)>,
    next_listener: u64,
    clock: Box<dyn Clock>,
    ids: IdSequence,
}

impl TodoStore {
    /// Create an empty store backed by `path`, using wall-clock time.
    ///
    /// Nothing is read until [`TodoStore::load`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Box::new(SystemClock))
    }

    /// Create an empty store backed by `path` with the given clock.
    pub fn with_clock(path: impl Into<PathBuf>, clock: Box<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            items: Vec::new(),
            last_loaded: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            clock,
            ids: IdSequence::new(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The root bucket.
    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    /// The tree as it stood right after the last load.
    pub fn last_loaded(&self) -> &[TaskItem] {
        &self.last_loaded
    }

    /// Replace the in-memory tree with the file's content.
    ///
    /// Never fails: a missing, unreadable or malformed file leaves the store
    /// empty. The loaded tree is normalized and sorted before use.
    pub fn load(&mut self) {
        let items = match file::read_document(&self.path) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable to-do file");
                Vec::new()
            }
        };

        self.items = normalize(items);
        order::sort_tree(&mut self.items);
        self.ids.observe(&self.items);
        self.last_loaded = self.items.clone();
        debug!(path = %self.path.display(), items = self.items.len(), "loaded to-do file");
    }

    /// Create an item in the root bucket or in the list `parent`.
    ///
    /// The title is trimmed; a blank title becomes a placeholder.
    pub fn add(
        &mut self,
        title: &str,
        due_time: Option<DateTime<Utc>>,
        parent: Option<&str>,
        is_list: bool,
    ) -> Result<TaskItem> {
        let now = self.clock.now();
        let mut id = self.ids.next(now);
        while find(&self.items, &id).is_some() {
            id = self.ids.next(now);
        }
        let mut item = TaskItem::new(id, commit_title(title, is_list), now);
        item.due_time = due_time;
        item.is_list = is_list;

        let before = self.items.clone();
        let bucket = match parent {
            None => &mut self.items,
            Some(parent_id) => {
                let parent = find_mut(&mut self.items, parent_id)
                    .ok_or_else(|| Error::NotFound(parent_id.to_string()))?;
                if !parent.is_list {
                    return Err(Error::NotAList(parent_id.to_string()));
                }
                &mut parent.children
            }
        };
        bucket.push(item.clone());

        self.commit(before)?;
        debug!(id = %item.id, is_list, "added item");
        Ok(item)
    }

    /// Apply the editable fields of `updated` to the live item with its id.
    ///
    /// Title and due time are always copied; the completion flag only for
    /// leaves. Returns `false` without touching anything when the id is
    /// unknown.
    pub fn update(&mut self, updated: &TaskItem) -> Result<bool> {
        let before = self.items.clone();
        let Some(existing) = find_mut(&mut self.items, &updated.id) else {
            return Ok(false);
        };

        existing.title = commit_title(&updated.title, existing.is_list);
        existing.due_time = updated.due_time;
        if !existing.is_list {
            existing.completed = updated.completed;
        }

        self.commit(before)?;
        debug!(id = %updated.id, "updated item");
        Ok(true)
    }

    /// Remove the item with `id` and everything below it.
    ///
    /// Returns `false` without touching anything when the id is unknown.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.items.clone();
        let Some(removed) = remove_by_id(&mut self.items, id) else {
            return Ok(false);
        };

        self.commit(before)?;
        debug!(id, descendants = removed.descendant_count(), "deleted item");
        Ok(true)
    }

    /// Direct children of `parent` (or the root bucket), sorted.
    ///
    /// An unknown parent id yields an empty view.
    pub fn get_sorted(&self, parent: Option<&str>, include_completed: bool) -> Vec<&TaskItem> {
        let bucket: &[TaskItem] = match parent {
            None => &self.items,
            Some(id) => match self.find_by_id(id) {
                Some(parent) => &parent.children,
                None => &[],
            },
        };
        order::sorted(bucket, include_completed)
    }

    /// Every leaf in the tree, sorted as one flat set.
    pub fn get_flattened_todos(&self, include_completed: bool) -> Vec<&TaskItem> {
        let mut leaves = Vec::new();
        collect_leaves(&self.items, &mut leaves);
        order::sorted(leaves, include_completed)
    }

    /// Find an item anywhere in the tree.
    pub fn find_by_id(&self, id: &str) -> Option<&TaskItem> {
        find(&self.items, id)
    }

    /// Find the list that holds `id`.
    ///
    /// `None` both for root-level items and for unknown ids.
    pub fn find_parent(&self, id: &str) -> Option<&TaskItem> {
        find_parent(&self.items, id, None)
    }

    /// Register a change observer. It is called after every successful save.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a change observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Re-sort and save a mutation. A failed save restores `before`.
    fn commit(&mut self, before: Vec<TaskItem>) -> Result<()> {
        order::sort_tree(&mut self.items);
        if let Err(e) = self.save() {
            self.items = before;
            return Err(e);
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        file::write_document(&self.path, &self.items)?;
        debug!(path = %self.path.display(), "saved to-do file");
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
        Ok(())
    }
}

fn find<'a>(items: &'a [TaskItem], id: &str) -> Option<&'a TaskItem> {
    for item in items {
        if item.id == id {
            return Some(item);
        }
        if item.is_list {
            if let Some(found) = find(&item.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_mut<'a>(items: &'a mut [TaskItem], id: &str) -> Option<&'a mut TaskItem> {
    for item in items.iter_mut() {
        if item.id == id {
            return Some(item);
        }
        if item.is_list {
            if let Some(found) = find_mut(&mut item.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_parent<'a>(
    items: &'a [TaskItem],
    id: &str,
    parent: Option<&'a TaskItem>,
) -> Option<&'a TaskItem> {
    for item in items {
        if item.id == id {
            return parent;
        }
        if item.is_list {
            if let Some(found) = find_parent(&item.children, id, Some(item)) {
                return Some(found);
            }
        }
    }
    None
}

/// Remove the first match: a bucket's own items are checked before any list
/// below it is descended into.
fn remove_by_id(items: &mut Vec<TaskItem>, id: &str) -> Option<TaskItem> {
    if let Some(index) = items.iter().position(|item| item.id == id) {
        return Some(items.remove(index));
    }
    items
        .iter_mut()
        .filter(|item| item.is_list)
        .find_map(|item| remove_by_id(&mut item.children, id))
}

fn collect_leaves<'a>(items: &'a [TaskItem], out: &mut Vec<&'a TaskItem>) {
    for item in items {
        if item.is_list {
            collect_leaves(&item.children, out);
        } else {
            out.push(item);
        }
    }
}

/// Get the data directory.
///
/// Uses `TODODS_DATA_DIR` when set, otherwise `<data_dir>/todods`
/// (e.g. `~/.local/share/todods` or `%APPDATA%\todods`).
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("todods"))
}

/// Default location of the to-do file.
pub fn default_data_file() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DATA_FILE_NAME))
}
