//! Fixed-length rolling window that is always full

use std::collections::VecDeque;

/// Holds exactly the initial number of items at all times. Pushing drops the oldest.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
}

impl<T: Copy> RollingWindow<T> {
    /// Creates a window of `len` copies of `fill`.
    ///
    /// # Panics
    ///
    /// Panics if `len == 0`.
    pub fn filled(len: usize, fill: T) -> Self {
        assert!(len > 0, "RollingWindow length must be > 0");
        Self {
            items: std::iter::repeat_n(fill, len).collect(),
        }
    }

    /// Appends `item`, evicting and returning the oldest
    pub fn push(&mut self, item: T) -> T {
        self.items.push_back(item);
        // Never empty: length is restored right after the push
        self.items.pop_front().unwrap_or(item)
    }

    /// Overwrites every slot with `fill`
    pub fn reset(&mut self, fill: T) {
        self.items.iter_mut().for_each(|slot| *slot = fill);
    }

    /// Oldest to newest
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut window = RollingWindow::filled(3, 0);
        assert_eq!(window.push(1), 0);
        assert_eq!(window.push(2), 0);
        assert_eq!(window.push(3), 0);
        assert_eq!(window.push(4), 1);
        assert_eq!(window.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_reset_keeps_length() {
        let mut window = RollingWindow::filled(4, 9);
        window.push(1);
        window.reset(5);
        assert_eq!(window.to_vec(), vec![5, 5, 5, 5]);
    }

    proptest! {
        #[test]
        fn prop_length_is_invariant(len in 1usize..64, pushes in proptest::collection::vec(any::<i32>(), 0..200)) {
            let mut window = RollingWindow::filled(len, 0);
            for value in &pushes {
                let before = window.to_vec();
                let evicted = window.push(*value);
                let after = window.to_vec();
                prop_assert_eq!(after.len(), len);
                prop_assert_eq!(evicted, before[0]);
                prop_assert_eq!(after.last(), Some(value));
            }
        }
    }
}
