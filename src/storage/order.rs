//! Bucket ordering.
//!
//! Every bucket is kept sorted by one composite key, ascending:
//! 1. lists before leaves
//! 2. incomplete leaves before completed ones
//! 3. items with a due time before items without
//! 4. earlier due time first
//! 5. earlier creation first
//!
//! Sorting is stable, so items equal on all five keys keep their relative order.

use std::cmp::Ordering;

use crate::models::TaskItem;

/// Compare two items of the same bucket.
pub fn compare(a: &TaskItem, b: &TaskItem) -> Ordering {
    b.is_list
        .cmp(&a.is_list)
        .then_with(|| a.is_done().cmp(&b.is_done()))
        .then_with(|| b.has_due_time().cmp(&a.has_due_time()))
        .then_with(|| a.due_time.cmp(&b.due_time))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Sorted view over a set of items, optionally without completed leaves.
pub fn sorted<'a, I>(items: I, include_completed: bool) -> Vec<&'a TaskItem>
where
    I: IntoIterator<Item = &'a TaskItem>,
{
    let mut view: Vec<&TaskItem> = items
        .into_iter()
        .filter(|item| include_completed || !item.is_done())
        .collect();
    view.sort_by(|a, b| compare(a, b));
    view
}

/// Sort a bucket and, recursively, every list below it.
pub fn sort_tree(items: &mut [TaskItem]) {
    items.sort_by(compare);
    for item in items.iter_mut().filter(|item| item.is_list) {
        sort_tree(&mut item.children);
    }
}

/// Whether a bucket and everything below it is already in order.
pub fn is_sorted_tree(items: &[TaskItem]) -> bool {
    items
        .windows(2)
        .all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater)
        && items.iter().all(|item| is_sorted_tree(&item.children))
}
