use std::borrow::Borrow;
use std::fmt;

/// Counting table that remembers the order in which keys were first seen.
///
/// Ties are always resolved in favour of the key that was seen first, so the
/// outcome of a vote depends only on the order of the votes.
pub struct Tally<K> {
    counts: Vec<(K, u32)>,
}

impl<K: Clone> Clone for Tally<K> {
    fn clone(&self) -> Self {
        Self {
            counts: self.counts.clone(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Tally<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.counts.iter().map(|(k, c)| (k, c)))
            .finish()
    }
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self { counts: Vec::new() }
    }
}

impl<K> Tally<K> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialEq + ToOwned<Owned = K>,
    {
        match self.counts.iter_mut().find(|(k, _)| k.borrow() == key) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((key.to_owned(), 1)),
        }
    }

    pub fn count<Q>(&self, key: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialEq,
    {
        self.counts
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    /// Key with the highest count; a later key needs a strictly higher count to win.
    pub fn most_common(&self) -> Option<&K> {
        let mut best: Option<&(K, u32)> = None;

        for entry in &self.counts {
            match best {
                Some(b) if entry.1 <= b.1 => {}
                _ => best = Some(entry),
            }
        }

        best.map(|(k, _)| k)
    }

    /// Up to `n` keys ordered by descending count, equal counts keep first-seen order.
    pub fn most_common_n(&self, n: usize) -> Vec<&K> {
        let mut order: Vec<&(K, u32)> = self.counts.iter().collect();

        // sort_by is stable
        order.sort_by(|a, b| b.1.cmp(&a.1));

        order.into_iter().take(n).map(|(k, _)| k).collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally_of(words: &[&str]) -> Tally<String> {
        let mut tally = Tally::new();
        for w in words {
            tally.push(*w);
        }
        tally
    }

    #[test]
    fn test_first_reached_maximum_wins() {
        let tally = tally_of(&["car", "car", "van", "van"]);

        assert_eq!(tally.most_common().map(String::as_str), Some("car"));
    }

    #[test]
    fn test_strictly_higher_count_displaces() {
        let tally = tally_of(&["car", "van", "van"]);

        assert_eq!(tally.most_common().map(String::as_str), Some("van"));
        assert_eq!(tally.count("van"), 2);
        assert_eq!(tally.count("bus"), 0);
    }

    #[test]
    fn test_most_common_n_keeps_insertion_order_on_ties() {
        let tally = tally_of(&["red", "blue", "grey", "blue", "white", "grey", "black"]);
        let top: Vec<&str> = tally.most_common_n(3).into_iter().map(String::as_str).collect();

        assert_eq!(top, vec!["blue", "grey", "red"]);
    }

    #[test]
    fn test_empty() {
        let tally: Tally<String> = Tally::new();

        assert!(tally.is_empty());
        assert!(tally.most_common().is_none());
        assert!(tally.most_common_n(3).is_empty());
    }
}
