//! Property keys and selection sets.
//!
//! A [`PropertySet<K>`] names which properties of a native object a view model
//! cares about. Keys come from a closed enum known at compile time; the set
//! has no fixed-width ceiling and is ordered for deterministic subscription.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

/// A closed, compile-time universe of observable properties.
pub trait PropertyKey: Copy + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every key of the universe.
    const ALL: &'static [Self];

    /// The native property name this key observes.
    fn name(self) -> &'static str;
}

/// A set of property keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PropertySet<K: PropertyKey> {
    keys: BTreeSet<K>,
}

impl<K: PropertyKey> PropertySet<K> {
    /// The empty selection.
    pub fn empty() -> Self {
        Self {
            keys: BTreeSet::new(),
        }
    }

    /// Every key of the universe.
    pub fn all() -> Self {
        K::ALL.iter().copied().collect()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: K) -> Self {
        self.keys.insert(key);
        self
    }

    /// Whether `key` is selected.
    pub fn contains(&self, key: K) -> bool {
        self.keys.contains(&key)
    }

    /// Number of selected keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate the selected keys in order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }
}

impl<K: PropertyKey> Default for PropertySet<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: PropertyKey> FromIterator<K> for PropertySet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<K: PropertyKey, const N: usize> From<[K; N]> for PropertySet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<K: PropertyKey> fmt::Debug for PropertySet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.keys.iter().map(|k| k.name()))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_keys {
    use super::PropertyKey;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Key {
        Scale,
        Rotation,
        Attribution,
    }

    impl PropertyKey for Key {
        const ALL: &'static [Self] = &[Key::Scale, Key::Rotation, Key::Attribution];

        fn name(self) -> &'static str {
            match self {
                Key::Scale => "mapScale",
                Key::Rotation => "rotation",
                Key::Attribution => "attributionText",
            }
        }
    }
}
