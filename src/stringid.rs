//! Interned string handles.
//!
//! `StringId` launders strings into directly comparable handles: two ids are
//! equal iff their backing bytes are equal, so equality is a single pointer
//! comparison. Interned strings live for the whole process. The table is
//! behind a mutex so command construction during the execution phase may
//! intern safely from worker threads.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

/// Handle to an interned string. Cheap to copy and compare.
#[derive(Clone, Copy)]
pub struct StringId(&'static str);

fn intern_table() -> &'static Mutex<HashSet<&'static str>> {
    static TABLE: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashSet::new()))
}

impl StringId {
    /// Interns `text` and returns its handle. Repeated calls with equal
    /// content return handles backed by the same allocation.
    pub fn new(text: &str) -> Self {
        let mut table = intern_table().lock().expect("string intern table poisoned");
        if let Some(&interned) = table.get(text) {
            return StringId(interned);
        }
        let interned: &'static str = Box::leak(text.to_owned().into_boxed_str());
        table.insert(interned);
        StringId(interned)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StringId {
    fn default() -> Self {
        StringId::new("")
    }
}

impl PartialEq for StringId {
    fn eq(&self, other: &Self) -> bool {
        // Interning guarantees equal content shares one allocation.
        std::ptr::eq(self.0.as_ptr(), other.0.as_ptr())
    }
}

impl Eq for StringId {}

impl Hash for StringId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state);
    }
}

impl PartialOrd for StringId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Content ordering keeps selector maps deterministic across runs.
        if self == other {
            std::cmp::Ordering::Equal
        } else {
            self.0.cmp(other.0)
        }
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringId({:?})", self.0)
    }
}

impl From<&str> for StringId {
    fn from(text: &str) -> Self {
        StringId::new(text)
    }
}

impl From<&String> for StringId {
    fn from(text: &String) -> Self {
        StringId::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_gives_equal_ids() {
        let a = StringId::new("IncludePaths");
        let b = StringId::new(&("Include".to_string() + "Paths"));
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.as_str().as_ptr(), b.as_str().as_ptr()));
    }

    #[test]
    fn different_content_gives_different_ids() {
        assert_ne!(StringId::new("debug"), StringId::new("release"));
    }

    #[test]
    fn empty_id_is_distinguished() {
        let empty = StringId::default();
        assert!(empty.is_empty());
        assert_eq!(empty, StringId::new(""));
        assert_ne!(empty, StringId::new("x"));
    }

    #[test]
    fn ordering_follows_content() {
        let mut ids = vec![StringId::new("c"), StringId::new("a"), StringId::new("b")];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
