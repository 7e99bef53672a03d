//! The option/property system.
//!
//! An [`OptionCollection`] is a type-erased map from interned option keys to
//! value cells. Each cell remembers the combine, clone and deduplicate
//! behaviour of whatever value type first occupied it, via the
//! [`OptionValue`] trait object it is stored as:
//!
//! - ordered sequences (`Vec<T>`) append on combine and drop later
//!   duplicates on deduplicate, preserving first-seen order,
//! - maps (`BTreeMap<K, V>`) merge with first-writer-wins,
//! - everything else replaces on combine and ignores deduplicate.
//!
//! User code extends the recognized option set by declaring an
//! [`OptionDef`] constant; new scalar value types only need a
//! [`scalar_option!`](crate::scalar_option) invocation, not a change to any
//! central schema.

mod standard;

pub use standard::*;

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use crate::stringid::StringId;

/// Typed handle into an [`OptionCollection`]: an interned key name paired
/// with a phantom value type. Declared as compile-time constants.
///
/// ```
/// use std::path::PathBuf;
/// use gantry::options::OptionDef;
///
/// const SHADER_FILES: OptionDef<Vec<PathBuf>> = OptionDef::new("ShaderFiles");
/// # let _ = SHADER_FILES;
/// ```
pub struct OptionDef<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> OptionDef<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> StringId {
        StringId::new(self.name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for OptionDef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OptionDef<T> {}

/// Behaviour captured by a value cell when it is first materialized.
pub trait OptionValue: Any {
    /// Merges `other` into `self`. Sequences append, maps keep the first
    /// writer, scalars replace.
    fn combine(&mut self, other: &dyn OptionValue);

    /// Deep copy of the cell.
    fn clone_cell(&self) -> Box<dyn OptionValue>;

    /// Removes later occurrences of equal elements from sequences; no-op
    /// for other value shapes.
    fn deduplicate(&mut self);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Clone + Eq + Hash + 'static> OptionValue for Vec<T> {
    fn combine(&mut self, other: &dyn OptionValue) {
        let other = other
            .as_any()
            .downcast_ref::<Vec<T>>()
            .expect("option cell combined with a different value type");
        self.extend(other.iter().cloned());
    }

    fn clone_cell(&self) -> Box<dyn OptionValue> {
        Box::new(self.clone())
    }

    fn deduplicate(&mut self) {
        let mut seen = HashSet::with_capacity(self.len());
        self.retain(|item| seen.insert(item.clone()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<K: Clone + Ord + 'static, V: Clone + 'static> OptionValue for BTreeMap<K, V> {
    fn combine(&mut self, other: &dyn OptionValue) {
        let other = other
            .as_any()
            .downcast_ref::<BTreeMap<K, V>>()
            .expect("option cell combined with a different value type");
        for (key, value) in other {
            self.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    fn clone_cell(&self) -> Box<dyn OptionValue> {
        Box::new(self.clone())
    }

    fn deduplicate(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Implements replace-on-combine [`OptionValue`] semantics for scalar value
/// types. The framework covers the standard ones; user code invokes this for
/// its own types.
#[macro_export]
macro_rules! scalar_option {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::options::OptionValue for $ty {
            fn combine(&mut self, other: &dyn $crate::options::OptionValue) {
                let other = other
                    .as_any()
                    .downcast_ref::<$ty>()
                    .expect("option cell combined with a different value type");
                *self = other.clone();
            }

            fn clone_cell(&self) -> Box<dyn $crate::options::OptionValue> {
                Box::new(self.clone())
            }

            fn deduplicate(&mut self) {}

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }
    )+};
}

scalar_option!(String, std::path::PathBuf, bool, i64, crate::stringid::StringId);

/// Map from option key to value cell.
#[derive(Default)]
pub struct OptionCollection {
    cells: BTreeMap<StringId, Box<dyn OptionValue>>,
}

impl std::fmt::Debug for OptionCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionCollection")
            .field("keys", &self.cells.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OptionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed read access. `None` if the key has never been materialized.
    ///
    /// Panics if the key was materialized with a different value type;
    /// mixing types under one key is a programming error in the build
    /// description.
    pub fn get<T: OptionValue>(&self, option: OptionDef<T>) -> Option<&T> {
        self.cells.get(&option.key()).map(|cell| {
            cell.as_any().downcast_ref::<T>().unwrap_or_else(|| {
                panic!("option '{}' accessed as two different value types", option.name())
            })
        })
    }

    /// Typed mutable access, materializing a default-constructed value if
    /// the key is absent. The reference is stable for the cell's lifetime.
    pub fn entry<T: OptionValue + Default>(&mut self, option: OptionDef<T>) -> &mut T {
        self.cells
            .entry(option.key())
            .or_insert_with(|| Box::new(T::default()) as Box<dyn OptionValue>)
            .as_any_mut()
            .downcast_mut::<T>()
            .unwrap_or_else(|| {
                panic!("option '{}' accessed as two different value types", option.name())
            })
    }

    /// Overwrites the cell with `value`.
    pub fn set<T: OptionValue>(&mut self, option: OptionDef<T>, value: T) {
        self.cells.insert(option.key(), Box::new(value));
    }

    /// Clone of the stored value, or the type's default when absent.
    pub fn value<T: OptionValue + Clone + Default>(&self, option: OptionDef<T>) -> T {
        self.get(option).cloned().unwrap_or_default()
    }

    /// Borrow of a sequence option; empty slice when absent.
    pub fn slice<T>(&self, option: OptionDef<Vec<T>>) -> &[T]
    where
        Vec<T>: OptionValue,
    {
        self.get(option).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends one element to a sequence option.
    pub fn push<T, U>(&mut self, option: OptionDef<Vec<T>>, item: U)
    where
        Vec<T>: OptionValue + Default,
        U: Into<T>,
    {
        self.entry(option).push(item.into());
    }

    /// Extends a sequence option, preserving order.
    pub fn append<T, I>(&mut self, option: OptionDef<Vec<T>>, items: I)
    where
        Vec<T>: OptionValue + Default,
        I: IntoIterator,
        I::Item: Into<T>,
    {
        self.entry(option).extend(items.into_iter().map(Into::into));
    }

    /// Per-key merge: clone cells absent from `self`, combine the rest with
    /// their captured semantics.
    pub fn combine(&mut self, other: &OptionCollection) {
        for (key, cell) in &other.cells {
            match self.cells.get_mut(key) {
                Some(existing) => existing.combine(cell.as_ref()),
                None => {
                    self.cells.insert(*key, cell.clone_cell());
                }
            }
        }
    }

    /// Deduplicates every cell.
    pub fn deduplicate(&mut self) {
        for cell in self.cells.values_mut() {
            cell.deduplicate();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Clone for OptionCollection {
    fn clone(&self) -> Self {
        Self {
            cells: self
                .cells
                .iter()
                .map(|(key, cell)| (*key, cell.clone_cell()))
                .collect(),
        }
    }
}
