use std::{
    iter::FusedIterator,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use crate::memory::EntityIndex;

/// A slab arena that hands out stable indices and recycles freed slots.
///
/// Freed slots form an intrusive free list, so a removed index is reused by the next insertion.
#[derive(Debug, Clone)]
pub struct Slab<K, V> {
    data: Vec<Entry<V>>,
    free: usize,
    len: usize,
    phantom: PhantomData<K>,
}

impl<K, V> Slab<K, V>
where
    K: EntityIndex,
{
    /// Creates an empty [`Slab<K, V>`].
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            free: 0,
            len: 0,
            phantom: PhantomData,
        }
    }

    /// Returns the number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there is no stored value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        matches!(self.data.get(key.index()), Some(Entry::Full(_)))
    }

    pub fn insert(&mut self, value: V) -> K {
        let index = self.free;

        if index == self.data.len() {
            self.data.push(Entry::Full(value));
            self.free += 1;
        } else {
            let Entry::Free(next) = self.data[index] else {
                unreachable!("free list points at an occupied slot")
            };
            self.free = next;
            self.data[index] = Entry::Full(value);
        }

        self.len += 1;

        K::new(index)
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let index = key.index();
        let entry = self.data.get_mut(index)?;

        match std::mem::replace(entry, Entry::Free(self.free)) {
            Entry::Free(next) => {
                *entry = Entry::Free(next);
                None
            }
            Entry::Full(value) => {
                self.free = index;
                self.len -= 1;
                Some(value)
            }
        }
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        match self.data.get(key.index()) {
            Some(Entry::Full(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        match self.data.get_mut(key.index()) {
            Some(Entry::Full(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            entries: self.data.iter().enumerate(),
            len: self.len,
            phantom: PhantomData,
        }
    }
}

impl<K, V> Index<K> for Slab<K, V>
where
    K: EntityIndex,
{
    type Output = V;

    fn index(&self, key: K) -> &Self::Output {
        self.get(key).expect("invalid key")
    }
}

impl<K, V> IndexMut<K> for Slab<K, V>
where
    K: EntityIndex,
{
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key).expect("invalid key")
    }
}

impl<K, V> Default for Slab<K, V>
where
    K: EntityIndex,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Entry<V> {
    Free(usize),
    Full(V),
}

/// Iterator over the occupied slots of a [`Slab`].
pub struct Iter<'a, K, V> {
    entries: std::iter::Enumerate<std::slice::Iter<'a, Entry<V>>>,
    len: usize,
    phantom: PhantomData<K>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: EntityIndex,
{
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (index, entry) in self.entries.by_ref() {
            if let Entry::Full(value) = entry {
                self.len -= 1;
                return Some((K::new(index), value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V>
where
    K: EntityIndex,
{
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> where K: EntityIndex {}

impl<'a, K, V> IntoIterator for &'a Slab<K, V>
where
    K: EntityIndex,
{
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::VertexIndex;

    #[test]
    fn removed_slots_are_recycled() {
        let mut slab = Slab::<VertexIndex, char>::new();
        let a = slab.insert('a');
        let b = slab.insert('b');
        let c = slab.insert('c');

        assert_eq!(slab.remove(b), Some('b'));
        assert_eq!(slab.remove(b), None);
        assert!(!slab.contains(b));
        assert_eq!(slab.len(), 2);

        let d = slab.insert('d');
        assert_eq!(d, b);
        assert_eq!(slab[d], 'd');
        assert!(slab.iter().map(|(k, _)| k).eq([a, d, c]));
    }
}
