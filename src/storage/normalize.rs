//! Structural repair of a freshly deserialized tree.
//!
//! Persisted data may have been edited by hand. The only structural fact
//! that can disagree with itself is the list flag: any item that owns
//! children is a list, whatever `isList` says.

use crate::models::TaskItem;

/// Repair a raw tree and return it.
pub fn normalize(mut items: Vec<TaskItem>) -> Vec<TaskItem> {
    normalize_in_place(&mut items);
    items
}

/// Repair every bucket of the tree, depth-first.
pub fn normalize_in_place(items: &mut [TaskItem]) {
    for item in items {
        if !item.children.is_empty() {
            item.is_list = true;
            normalize_in_place(&mut item.children);
        }
    }
}
