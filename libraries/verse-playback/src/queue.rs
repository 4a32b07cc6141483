//! Queue management
//!
//! Pure bookkeeping over the ordered item list and the current index. The
//! queue never talks to pipelines; it reports what changed through
//! [`QueueChange`] and the player decides what to do about it.
//!
//! Invariant: `current` is `None` exactly when the queue is empty, otherwise
//! it is a valid index into `items`.

use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};
use crate::types::{QueueItem, RepeatMode};

/// Details of a current-item transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentItemChange {
    /// The new current item (`None` when the queue became empty)
    pub item: Option<QueueItem>,
    /// Index of the new current item
    pub index: Option<usize>,
    /// The item that was current before the change
    pub previous_item: Option<QueueItem>,
    /// Index the previous item occupied before the change
    pub previous_index: Option<usize>,
}

/// What a queue mutation did to the current item
#[derive(Debug, Clone, PartialEq)]
pub enum QueueChange {
    /// Current item unaffected
    None,
    /// The queue went from empty to non-empty; index 0 became current
    FirstItem { index: usize },
    /// The current item changed
    CurrentChanged(CurrentItemChange),
    /// Navigation landed on the index that was already current (replay)
    SkipToSame { index: usize },
}

/// Ordered playback queue with a current index
#[derive(Debug, Default, Clone)]
pub struct QueueManager {
    items: Vec<QueueItem>,
    current: Option<usize>,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items in the queue
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in queue order
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// Item at the given index
    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Index of the current item
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The current item
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Replace the whole queue with a single item and make it current
    pub fn replace_current(&mut self, item: QueueItem) -> CurrentItemChange {
        let previous_item = self.current_item().cloned();
        let previous_index = self.current;

        self.items.clear();
        self.items.push(item.clone());
        self.current = Some(0);

        CurrentItemChange {
            item: Some(item),
            index: Some(0),
            previous_item,
            previous_index,
        }
    }

    /// Append items to the end of the queue
    ///
    /// If the queue was empty, index 0 becomes current.
    pub fn add(&mut self, items: Vec<QueueItem>) -> QueueChange {
        let index = self.items.len();
        // Appending cannot produce an invalid index
        match self.add_at(items, index) {
            Ok(change) => change,
            Err(_) => QueueChange::None,
        }
    }

    /// Insert items at the given index (0..=len)
    ///
    /// Inserting at or before the current index shifts it so the same item
    /// stays current. If the queue was empty, index 0 becomes current.
    pub fn add_at(&mut self, items: Vec<QueueItem>, index: usize) -> Result<QueueChange> {
        if index > self.items.len() {
            return Err(PlaybackError::IndexOutOfRange(index));
        }
        if items.is_empty() {
            return Ok(QueueChange::None);
        }

        let was_empty = self.items.is_empty();
        let count = items.len();
        self.items.splice(index..index, items);

        if was_empty {
            self.current = Some(0);
            return Ok(QueueChange::FirstItem { index: 0 });
        }

        if let Some(current) = self.current {
            if index <= current {
                self.current = Some(current + count);
            }
        }
        Ok(QueueChange::None)
    }

    /// Remove the item at the given index
    ///
    /// Removing the current item promotes the following item (or the new
    /// last item when the current one was last); that always reports a
    /// [`QueueChange::CurrentChanged`], even when the queue becomes empty.
    pub fn remove(&mut self, index: usize) -> Result<QueueChange> {
        if index >= self.items.len() {
            return Err(PlaybackError::IndexOutOfRange(index));
        }

        let removed = self.items.remove(index);
        let Some(current) = self.current else {
            return Ok(QueueChange::None);
        };

        if index < current {
            self.current = Some(current - 1);
            return Ok(QueueChange::None);
        }
        if index > current {
            return Ok(QueueChange::None);
        }

        // Removed the current item
        let new_index = if self.items.is_empty() {
            None
        } else if index < self.items.len() {
            Some(index)
        } else {
            Some(self.items.len() - 1)
        };
        self.current = new_index;

        Ok(QueueChange::CurrentChanged(CurrentItemChange {
            item: self.current_item().cloned(),
            index: new_index,
            previous_item: Some(removed),
            previous_index: Some(index),
        }))
    }

    /// Move an item from one index to another
    ///
    /// The current index follows the logical item, so the same item stays
    /// current after the move.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.items.len() {
            return Err(PlaybackError::IndexOutOfRange(from));
        }
        if to >= self.items.len() {
            return Err(PlaybackError::IndexOutOfRange(to));
        }
        if from == to {
            return Ok(());
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(current) = self.current {
            self.current = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        Ok(())
    }

    /// Advance to the next item
    ///
    /// At the last item, `wrap` selects index 0; without it this is a no-op
    /// reported as [`QueueChange::None`] so the caller can detect
    /// end-of-queue. Wrapping back onto the only item reports
    /// [`QueueChange::SkipToSame`].
    pub fn next(&mut self, wrap: bool) -> QueueChange {
        let Some(current) = self.current else {
            return QueueChange::None;
        };

        let target = if current + 1 < self.items.len() {
            current + 1
        } else if wrap {
            0
        } else {
            return QueueChange::None;
        };

        self.select(target)
    }

    /// Step back to the previous item
    ///
    /// Mirror of [`Self::next`]: `wrap` selects the last item from index 0.
    pub fn previous(&mut self, wrap: bool) -> QueueChange {
        let Some(current) = self.current else {
            return QueueChange::None;
        };

        let target = if current > 0 {
            current - 1
        } else if wrap {
            self.items.len() - 1
        } else {
            return QueueChange::None;
        };

        self.select(target)
    }

    /// Jump straight to the given index
    ///
    /// Jumping to the index that is already current reports
    /// [`QueueChange::SkipToSame`], which the player treats as a replay.
    pub fn jump(&mut self, index: usize) -> Result<QueueChange> {
        if index >= self.items.len() {
            return Err(PlaybackError::IndexOutOfRange(index));
        }
        Ok(self.select(index))
    }

    /// Drop every item after the current one
    pub fn remove_upcoming(&mut self) {
        if let Some(current) = self.current {
            self.items.truncate(current + 1);
        }
    }

    /// Drop every item before the current one
    pub fn remove_previous(&mut self) {
        if let Some(current) = self.current {
            self.items.drain(..current);
            self.current = Some(0);
        }
    }

    /// Remove all items
    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    /// Index the queue would advance to at end of media, if any
    ///
    /// Used by the crossfade orchestrator to pick the preload target.
    /// Repeat-one replays in place, so it never has a next index; repeat-all
    /// wraps to 0 only when there is more than one item (a single-item wrap
    /// is a replay, not a transition).
    pub fn peek_next_index(&self, repeat: RepeatMode) -> Option<usize> {
        let current = self.current?;
        match repeat {
            RepeatMode::One => None,
            _ if current + 1 < self.items.len() => Some(current + 1),
            RepeatMode::All if self.items.len() > 1 => Some(0),
            _ => None,
        }
    }

    fn select(&mut self, index: usize) -> QueueChange {
        let Some(current) = self.current else {
            return QueueChange::None;
        };
        if index == current {
            return QueueChange::SkipToSame { index };
        }

        let previous_item = self.current_item().cloned();
        self.current = Some(index);

        QueueChange::CurrentChanged(CurrentItemChange {
            item: self.current_item().cloned(),
            index: Some(index),
            previous_item,
            previous_index: Some(current),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> QueueItem {
        QueueItem::file(format!("/music/{name}.flac"))
    }

    fn queue_of(names: &[&str]) -> QueueManager {
        let mut queue = QueueManager::new();
        queue.add(names.iter().map(|n| item(n)).collect());
        queue
    }

    #[test]
    fn empty_queue_has_no_current() {
        let queue = QueueManager::new();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.current_item(), None);
    }

    #[test]
    fn first_add_selects_index_zero() {
        let mut queue = QueueManager::new();
        let change = queue.add(vec![item("a"), item("b")]);

        assert_eq!(change, QueueChange::FirstItem { index: 0 });
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current_item(), Some(&item("a")));
    }

    #[test]
    fn add_empty_batch_is_a_no_op() {
        let mut queue = QueueManager::new();
        assert_eq!(queue.add(vec![]), QueueChange::None);
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn insert_before_current_preserves_logical_item() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.jump(1).unwrap();

        let change = queue.add_at(vec![item("x"), item("y")], 0).unwrap();
        assert_eq!(change, QueueChange::None);
        assert_eq!(queue.current_index(), Some(3));
        assert_eq!(queue.current_item(), Some(&item("b")));
    }

    #[test]
    fn insert_after_current_leaves_index_alone() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.jump(1).unwrap();

        queue.add_at(vec![item("x")], 2).unwrap();
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn add_at_past_end_fails() {
        let mut queue = queue_of(&["a"]);
        let err = queue.add_at(vec![item("x")], 5).unwrap_err();
        assert!(matches!(err, PlaybackError::IndexOutOfRange(5)));
    }

    #[test]
    fn replace_current_resets_to_single_item() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.jump(2).unwrap();

        let change = queue.replace_current(item("solo"));
        assert_eq!(change.item, Some(item("solo")));
        assert_eq!(change.index, Some(0));
        assert_eq!(change.previous_item, Some(item("c")));
        assert_eq!(change.previous_index, Some(2));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn remove_before_current_shifts_index_silently() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.jump(2).unwrap();

        let change = queue.remove(0).unwrap();
        assert_eq!(change, QueueChange::None);
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current_item(), Some(&item("c")));
    }

    #[test]
    fn remove_after_current_is_silent() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let change = queue.remove(2).unwrap();
        assert_eq!(change, QueueChange::None);
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn remove_current_promotes_following_item() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.jump(1).unwrap();

        let change = queue.remove(1).unwrap();
        let QueueChange::CurrentChanged(change) = change else {
            panic!("expected CurrentChanged, got {change:?}");
        };
        assert_eq!(change.item, Some(item("c")));
        assert_eq!(change.index, Some(1));
        assert_eq!(change.previous_item, Some(item("b")));
        assert_eq!(queue.current_item(), Some(&item("c")));
    }

    #[test]
    fn remove_current_last_item_falls_back_to_previous() {
        let mut queue = queue_of(&["a", "b"]);
        queue.jump(1).unwrap();

        let change = queue.remove(1).unwrap();
        let QueueChange::CurrentChanged(change) = change else {
            panic!("expected CurrentChanged, got {change:?}");
        };
        assert_eq!(change.item, Some(item("a")));
        assert_eq!(change.index, Some(0));
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn remove_only_item_empties_queue() {
        let mut queue = queue_of(&["a"]);
        let change = queue.remove(0).unwrap();
        let QueueChange::CurrentChanged(change) = change else {
            panic!("expected CurrentChanged, got {change:?}");
        };
        assert_eq!(change.item, None);
        assert_eq!(change.index, None);
        assert_eq!(change.previous_item, Some(item("a")));
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn remove_out_of_range_fails() {
        let mut queue = queue_of(&["a"]);
        assert!(matches!(
            queue.remove(1),
            Err(PlaybackError::IndexOutOfRange(1))
        ));
    }

    #[test]
    fn move_item_follows_current() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.jump(1).unwrap();

        // Move the current item itself
        queue.move_item(1, 3).unwrap();
        assert_eq!(queue.current_index(), Some(3));
        assert_eq!(queue.current_item(), Some(&item("b")));

        // Move another item across the current one
        queue.move_item(0, 3).unwrap();
        assert_eq!(queue.current_index(), Some(2));
        assert_eq!(queue.current_item(), Some(&item("b")));
    }

    #[test]
    fn move_item_bounds_checked() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(queue.move_item(0, 2).is_err());
        assert!(queue.move_item(2, 0).is_err());
        assert!(queue.move_item(1, 1).is_ok());
    }

    #[test]
    fn next_advances_and_stops_at_end() {
        let mut queue = queue_of(&["a", "b"]);

        let change = queue.next(false);
        assert!(matches!(change, QueueChange::CurrentChanged(_)));
        assert_eq!(queue.current_index(), Some(1));

        // At the last item, no wrap: stays put so the caller can detect it
        let change = queue.next(false);
        assert_eq!(change, QueueChange::None);
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn next_wraps_to_start() {
        let mut queue = queue_of(&["a", "b"]);
        queue.jump(1).unwrap();

        let change = queue.next(true);
        let QueueChange::CurrentChanged(change) = change else {
            panic!("expected CurrentChanged, got {change:?}");
        };
        assert_eq!(change.index, Some(0));
        assert_eq!(change.previous_index, Some(1));
    }

    #[test]
    fn wrap_on_single_item_is_skip_to_same() {
        let mut queue = queue_of(&["a"]);
        assert_eq!(queue.next(true), QueueChange::SkipToSame { index: 0 });
        assert_eq!(queue.previous(true), QueueChange::SkipToSame { index: 0 });
    }

    #[test]
    fn previous_steps_back_and_wraps() {
        let mut queue = queue_of(&["a", "b", "c"]);

        assert_eq!(queue.previous(false), QueueChange::None);
        assert_eq!(queue.current_index(), Some(0));

        let change = queue.previous(true);
        assert!(matches!(change, QueueChange::CurrentChanged(_)));
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn navigation_on_empty_queue_is_silent() {
        let mut queue = QueueManager::new();
        assert_eq!(queue.next(true), QueueChange::None);
        assert_eq!(queue.previous(true), QueueChange::None);
    }

    #[test]
    fn jump_to_current_is_skip_to_same() {
        let mut queue = queue_of(&["a", "b"]);
        assert_eq!(queue.jump(0).unwrap(), QueueChange::SkipToSame { index: 0 });
    }

    #[test]
    fn jump_out_of_range_fails() {
        let mut queue = queue_of(&["a"]);
        assert!(matches!(
            queue.jump(3),
            Err(PlaybackError::IndexOutOfRange(3))
        ));
    }

    #[test]
    fn remove_upcoming_truncates_after_current() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.jump(1).unwrap();

        queue.remove_upcoming();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current_item(), Some(&item("b")));
    }

    #[test]
    fn remove_previous_drops_history() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.jump(2).unwrap();

        queue.remove_previous();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current_item(), Some(&item("c")));
    }

    #[test]
    fn clear_resets_everything() {
        let mut queue = queue_of(&["a", "b"]);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn peek_next_respects_repeat_mode() {
        let mut queue = queue_of(&["a", "b", "c"]);

        assert_eq!(queue.peek_next_index(RepeatMode::Off), Some(1));
        assert_eq!(queue.peek_next_index(RepeatMode::One), None);

        queue.jump(2).unwrap();
        assert_eq!(queue.peek_next_index(RepeatMode::Off), None);
        assert_eq!(queue.peek_next_index(RepeatMode::All), Some(0));
    }

    #[test]
    fn peek_next_single_item_never_wraps() {
        let queue = queue_of(&["a"]);
        assert_eq!(queue.peek_next_index(RepeatMode::All), None);
    }
}
