//! Helpers that keep "exactly one default" true for address and card lists.

use crate::models::DefaultFlag;

/// Makes `index` the only default in `items`.
pub(crate) fn promote<T: DefaultFlag>(items: &mut [T], index: usize) {
    for (i, item) in items.iter_mut().enumerate() {
        item.set_default_flag(i == index);
    }
}

/// Restores the single-default invariant: the first flagged element keeps its
/// flag and any others are cleared; with no flagged element the first one is
/// elected. Returns the index of the default, `None` for an empty list.
pub(crate) fn repair<T: DefaultFlag>(items: &mut [T]) -> Option<usize> {
    if items.is_empty() {
        return None;
    }
    let index = items.iter().position(|i| i.is_default()).unwrap_or(0);
    promote(items, index);
    Some(index)
}

pub(crate) fn default_count<T: DefaultFlag>(items: &[T]) -> usize {
    items.iter().filter(|i| i.is_default()).count()
}
