//! Interned name atoms.
//!
//! Target names, toolchain names, and build-arg identifiers repeat across
//! thousands of labels and get compared on every dependency link. Each
//! distinct name is stored once in a process-wide table; an atom is the
//! table slot it landed in, so equality and hashing are integer operations
//! and copies are free.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{LazyLock, Mutex};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The process-wide name table. Content is kept for the life of the
/// process; a name's slot never changes once assigned.
struct NameTable {
    by_content: HashMap<&'static str, u32>,
    slots: Vec<&'static str>,
}

impl NameTable {
    fn intern(&mut self, s: &str) -> (u32, &'static str) {
        if let Some(&index) = self.by_content.get(s) {
            return (index, self.slots[index as usize]);
        }

        // First sighting of this name: give it the next slot.
        let content: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(self.slots.len()).expect("name table overflow");
        self.slots.push(content);
        self.by_content.insert(content, index);
        (index, content)
    }
}

static NAMES: LazyLock<Mutex<NameTable>> = LazyLock::new(|| {
    Mutex::new(NameTable {
        by_content: HashMap::new(),
        slots: Vec::new(),
    })
});

/// A name interned in the process-wide table.
///
/// Two atoms with the same content always occupy the same slot, so
/// comparing or hashing them never touches the string data. Ordering still
/// goes by content so sorted containers keyed by names come out in a human
/// order rather than first-sighting order.
#[derive(Clone, Copy)]
pub struct InternedString {
    index: u32,
    content: &'static str,
}

impl InternedString {
    /// Intern a name, reusing its slot when it has been seen before.
    ///
    /// Takes the table lock; this happens once per name occurrence during
    /// generation, which is rare next to the comparisons it pays for.
    pub fn new(s: impl AsRef<str>) -> Self {
        let (index, content) = NAMES.lock().unwrap().intern(s.as_ref());
        InternedString { index, content }
    }

    /// The name itself.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.content
    }
}

impl Default for InternedString {
    fn default() -> Self {
        InternedString::new("")
    }
}

impl Deref for InternedString {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.content
    }
}

impl PartialEq for InternedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for InternedString {}

impl Hash for InternedString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state)
    }
}

impl PartialOrd for InternedString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedString {
    fn cmp(&self, other: &Self) -> Ordering {
        // Same slot means same content; skip the character compare.
        if self.index == other.index {
            return Ordering::Equal;
        }
        self.content.cmp(other.content)
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.content, f)
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content)
    }
}

impl From<&str> for InternedString {
    fn from(s: &str) -> Self {
        InternedString::new(s)
    }
}

impl From<String> for InternedString {
    fn from(s: String) -> Self {
        InternedString::new(s)
    }
}

impl Serialize for InternedString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.content)
    }
}

impl<'de> Deserialize<'de> for InternedString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(InternedString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_same_name_shares_a_slot() {
        let a = InternedString::new("base");
        let b = InternedString::new(String::from("base"));

        assert_eq!(a, b);
        assert_eq!(a.index, b.index);
        assert!(std::ptr::eq(a.content, b.content));
    }

    #[test]
    fn test_distinct_names_differ() {
        let base = InternedString::new("base");
        let tests = InternedString::new("base_unittests");
        assert_ne!(base, tests);
        assert_ne!(base.index, tests.index);
    }

    #[test]
    fn test_ordering_is_by_content_not_slot() {
        // Slot order follows first sighting; ordering must not.
        let z = InternedString::new("zlib");
        let a = InternedString::new("allocator");
        assert!(a < z);

        let mut deps: BTreeMap<InternedString, u32> = BTreeMap::new();
        deps.insert(z, 1);
        deps.insert(a, 2);
        assert_eq!(deps.keys().next().unwrap().as_str(), "allocator");
    }

    #[test]
    fn test_usable_as_hash_key() {
        let mut values: HashMap<InternedString, i32> = HashMap::new();
        values.insert(InternedString::new("deps"), 3);
        assert_eq!(values.get(&InternedString::new("deps")), Some(&3));
    }

    #[test]
    fn test_serde_roundtrip() {
        let name = InternedString::new("shlib");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"shlib\"");

        let back: InternedString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
        assert_eq!(back.as_str(), "shlib");
    }
}
