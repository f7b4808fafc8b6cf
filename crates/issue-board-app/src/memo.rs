//! Single-slot memoization keyed on declared inputs.

use std::sync::Arc;

/// Caches the last computed value together with the inputs it was derived from.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, Arc<V>)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    /// Return the cached value when `key` matches, otherwise recompute it.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some((cached_key, value)) = &self.slot
            && *cached_key == key
        {
            return Arc::clone(value);
        }
        let value = Arc::new(compute());
        self.slot = Some((key, Arc::clone(&value)));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn recomputes_only_when_key_changes() {
        let calls = Cell::new(0);
        let mut memo = Memo::default();
        let compute = |n: u32| {
            calls.set(calls.get() + 1);
            n * 2
        };

        assert_eq!(*memo.get_or_compute(1, || compute(1)), 2);
        assert_eq!(*memo.get_or_compute(1, || compute(1)), 2);
        assert_eq!(calls.get(), 1);
        assert_eq!(*memo.get_or_compute(2, || compute(2)), 4);
        assert_eq!(calls.get(), 2);
        assert_eq!(*memo.get_or_compute(1, || compute(1)), 2);
        assert_eq!(calls.get(), 3);
    }
}
