//! Array storage: shared data blocks and windowed views
//!
//! A data block is reference-counted; wrappers are `(data, offset,
//! count)` views over it. Views share the block, and the block is
//! freed exactly when the last view holding it goes away.

use crate::Value;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Contiguous owned block of values, mutated in place by `Append`
#[derive(Debug)]
pub struct ArrayData {
    id: u64,
    items: RefCell<Vec<Value>>,
}

impl ArrayData {
    fn new(id: u64, prealloc: usize) -> Self {
        Self { id, items: RefCell::new(Vec::with_capacity(prealloc)) }
    }

    /// Identity of the block; stable for its whole lifetime
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn push(&self, item: Value) {
        self.items.borrow_mut().push(item);
    }

    pub fn get(&self, idx: usize) -> Option<Value> {
        self.items.borrow().get(idx).cloned()
    }

    pub fn set(&self, idx: usize, item: Value) {
        self.items.borrow_mut()[idx] = item;
    }

    pub fn retain(&self, keep: impl FnMut(&Value) -> bool) {
        self.items.borrow_mut().retain(keep);
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.items.borrow()
    }
}

/// A view over shared array storage.
///
/// `count == None` means the view tracks the whole block, so values
/// appended after the view was taken remain visible through it. A
/// bounded view fixes its window at creation.
#[derive(Clone)]
pub struct ArrayRef {
    data: Rc<ArrayData>,
    offset: usize,
    count: Option<usize>,
}

impl ArrayRef {
    pub fn whole(data: Rc<ArrayData>) -> Self {
        Self { data, offset: 0, count: None }
    }

    pub fn view(data: Rc<ArrayData>, offset: usize, count: usize) -> Self {
        Self { data, offset, count: Some(count) }
    }

    pub fn data(&self) -> &Rc<ArrayData> {
        &self.data
    }

    pub fn id(&self) -> u64 {
        self.data.id()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        match self.count {
            Some(n) => n.min(self.data.len().saturating_sub(self.offset)),
            None => self.data.len().saturating_sub(self.offset),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Option<Value> {
        if idx >= self.len() {
            return None;
        }
        self.data.get(self.offset + idx)
    }

    /// Everything but the first element, as a view over the same block
    pub fn tail(&self) -> ArrayRef {
        let len = self.len().saturating_sub(1);
        ArrayRef::view(Rc::clone(&self.data), self.offset + 1, len)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Identity comparison: same block, same window
    pub fn same_view(&self, other: &ArrayRef) -> bool {
        self.id() == other.id() && self.offset == other.offset && self.len() == other.len()
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("id", &self.id())
            .field("offset", &self.offset)
            .field("len", &self.len())
            .finish()
    }
}

impl PartialEq for ArrayRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_view(other)
    }
}

/// Owner-of-record for array blocks.
///
/// Allocation hands out reference-counted blocks; the store only keeps
/// the identity counter, so a block's lifetime is governed purely by
/// the views over it.
#[derive(Debug, Default)]
pub struct ValueStore {
    next_id: u64,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_array(&mut self, prealloc: usize) -> Rc<ArrayData> {
        let id = self.next_id;
        self.next_id += 1;
        Rc::new(ArrayData::new(id, prealloc))
    }

    /// Wraps a block into a whole-block view
    pub fn wrap(&mut self, data: Rc<ArrayData>) -> ArrayRef {
        ArrayRef::whole(data)
    }

    /// Allocates a block and wraps it in one go
    pub fn alloc_wrapped(&mut self, prealloc: usize) -> ArrayRef {
        let data = self.allocate_array(prealloc);
        ArrayRef::whole(data)
    }

    /// Builds an array value out of ready elements
    pub fn from_values(&mut self, items: Vec<Value>) -> ArrayRef {
        let data = self.allocate_array(items.len());
        for it in items {
            data.push(it);
        }
        ArrayRef::whole(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn whole_views_track_appends() {
        let mut store = ValueStore::new();
        let arr = store.alloc_wrapped(2);
        assert_eq!(arr.len(), 0);
        arr.data().push(Value::Int(1));
        arr.data().push(Value::Int(2));
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.get(1), Some(Value::Int(2)));
    }

    #[test]
    fn bounded_views_stay_fixed() {
        let mut store = ValueStore::new();
        let arr = store.from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let tail = arr.tail();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.get(0), Some(Value::Int(2)));
        arr.data().push(Value::Int(4));
        assert_eq!(tail.len(), 2);
    }

    #[test]
    fn last_view_frees_the_block() {
        let mut store = ValueStore::new();
        let arr = store.from_values(vec![Value::Int(1)]);
        let weak = Rc::downgrade(arr.data());
        let tail = arr.tail();
        drop(arr);
        assert!(weak.upgrade().is_some());
        drop(tail);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn blocks_have_distinct_ids() {
        let mut store = ValueStore::new();
        let a = store.alloc_wrapped(0);
        let b = store.alloc_wrapped(0);
        assert_ne!(a.id(), b.id());
    }
}
