//! Owned list buffers for native attribute values.
//!
//! Every variable-length field in a native attribute is backed by an
//! [`OwnedList`]. A buffer is allocated exactly once when an attribute is
//! decoded and consumed exactly once, either by encoding the attribute back
//! to wire form or by dropping the value. A per-thread live-buffer count
//! makes the pairing checkable from tests; the codec never moves a buffer
//! across threads mid-conversion, so the count is exact on the thread doing
//! the converting.
use std::cell::Cell;

thread_local! {
    static LIVE_BUFFERS: Cell<usize> = const { Cell::new(0) };
}

/// Number of list buffers currently alive on this thread.
pub fn live_buffers() -> usize {
    LIVE_BUFFERS.with(Cell::get)
}

fn track_allocation() {
    LIVE_BUFFERS.with(|live| live.set(live.get() + 1));
}

fn track_release() {
    LIVE_BUFFERS.with(|live| live.set(live.get().saturating_sub(1)));
}

/// A single-owner list buffer holding `count` elements.
///
/// The element count and the buffer length are the same thing here; they
/// cannot drift apart the way a raw count-plus-pointer pair can.
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedList<T> {
    items: Vec<T>,
}

impl<T> OwnedList<T> {
    pub fn with_capacity(count: usize) -> Self {
        track_allocation();
        Self {
            items: Vec::with_capacity(count),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn count(&self) -> u32 {
        self.items.len() as u32
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Consumes the buffer, releasing it. This is the single release point
    /// balancing the allocation in decode; the borrow checker rules out a
    /// second consumption.
    pub fn into_vec(mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}

impl<T: Clone> Clone for OwnedList<T> {
    fn clone(&self) -> Self {
        track_allocation();
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> From<Vec<T>> for OwnedList<T> {
    fn from(items: Vec<T>) -> Self {
        track_allocation();
        Self { items }
    }
}

impl<T> Drop for OwnedList<T> {
    fn drop(&mut self) {
        track_release();
    }
}

impl<'a, T> IntoIterator for &'a OwnedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_on_drop() {
        let before = live_buffers();
        {
            let mut list = OwnedList::with_capacity(3);
            for i in 0..3u32 {
                list.push(i);
            }
            assert_eq!(live_buffers(), before + 1);
        }
        assert_eq!(live_buffers(), before);
    }

    #[test]
    fn balance_on_consume() {
        let before = live_buffers();
        let list: OwnedList<u8> = vec![1, 2, 3].into();
        let items = list.into_vec();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(live_buffers(), before);
    }

    #[test]
    fn clone_counts_as_allocation() {
        let before = live_buffers();
        let list: OwnedList<u8> = vec![9].into();
        let copy = list.clone();
        assert_eq!(live_buffers(), before + 2);
        drop(list);
        drop(copy);
        assert_eq!(live_buffers(), before);
    }

    #[test]
    fn count_tracks_length() {
        let mut list = OwnedList::with_capacity(0);
        assert_eq!(list.count(), 0);
        list.push(7u16);
        list.push(8u16);
        assert_eq!(list.count(), 2);
        assert_eq!(list.len(), list.count() as usize);
    }
}
