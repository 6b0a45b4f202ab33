/// Token-indexed storage for selector registrations.
///
/// Freed slots are reused, so a token is only meaningful while its entry is
/// present.
pub(crate) struct Slab<T> {
    items: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) fn with_capacity(size: usize) -> Self {
        Self {
            items: Vec::with_capacity(size),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, item: T) -> usize {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.items.push(None);
                self.items.len() - 1
            }
        };

        self.items[index] = Some(item);
        self.len += 1;

        index
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index).and_then(Option::as_mut)
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;

        self.free.push(index);
        self.len -= 1;

        Some(item)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_ref().map(|_| index))
            .collect()
    }

    /// Removes every entry, in index order.
    pub(crate) fn drain(&mut self) -> Vec<(usize, T)> {
        let drained = self
            .items
            .iter_mut()
            .enumerate()
            .filter_map(|(index, item)| item.take().map(|item| (index, item)))
            .collect();

        self.items.clear();
        self.free.clear();
        self.len = 0;

        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut slab = Slab::with_capacity(4);
        let a = slab.insert("a");
        let b = slab.insert("b");

        assert_ne!(a, b);
        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab.get(b), Some(&"b"));
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn test_remove_reuses_slot() {
        let mut slab = Slab::with_capacity(1);
        let a = slab.insert(1);
        assert_eq!(slab.remove(a), Some(1));
        assert!(!slab.contains(a));
        assert!(slab.is_empty());

        let b = slab.insert(2);
        assert_eq!(a, b);
        assert_eq!(slab.get(b), Some(&2));
    }

    #[test]
    fn test_double_remove_is_none() {
        let mut slab = Slab::with_capacity(1);
        let a = slab.insert(1);

        assert_eq!(slab.remove(a), Some(1));
        assert_eq!(slab.remove(a), None);
        assert_eq!(slab.remove(42), None);
    }

    #[test]
    fn test_drain_returns_live_entries() {
        let mut slab = Slab::with_capacity(3);
        let a = slab.insert('a');
        let b = slab.insert('b');
        let c = slab.insert('c');
        slab.remove(b);

        assert_eq!(slab.keys(), vec![a, c]);
        assert_eq!(slab.drain(), vec![(a, 'a'), (c, 'c')]);
        assert!(slab.is_empty());
    }

    #[test]
    fn test_get_mut() {
        let mut slab = Slab::with_capacity(1);
        let a = slab.insert(String::from("x"));
        slab.get_mut(a).unwrap().push('y');

        assert_eq!(slab.get(a).map(String::as_str), Some("xy"));
    }
}
