//! Shallow Equality
//!
//! Change detection in the store is shallow: sequences and key-value maps are
//! compared one level deep, element by element, and everything else is
//! compared by identity.
//!
//! Two traits carry this:
//!
//! - [`ShallowEq`] is the top-level comparison applied to a whole slot value
//!   or a selector projection.
//! - [`Identical`] is the per-element comparison used one level down. For
//!   plain data (numbers, strings, booleans) identity is value equality; for
//!   shared pointers (`Arc`, `Rc`) it is pointer equality.
//!
//! Record-like structs opt in with [`impl_shallow_eq!`](crate::impl_shallow_eq),
//! which compares the listed fields with [`Identical`].

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

/// Top-level shallow comparison of two values of the same type.
pub trait ShallowEq {
    /// Returns true when `self` and `other` are equal one level deep.
    fn shallow_eq(&self, other: &Self) -> bool;
}

/// Identity comparison used for the elements of a shallow comparison.
pub trait Identical {
    /// Returns true when `self` and `other` are the same value.
    fn identical(&self, other: &Self) -> bool;
}

/// Compare two possibly-absent values.
///
/// Two absent values are equal; an absent and a present value never are.
pub fn shallow_equal<T: ShallowEq + ?Sized>(a: Option<&T>, b: Option<&T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.shallow_eq(b),
        _ => false,
    }
}

/// Implement [`ShallowEq`] for a record type, or both traits for a leaf type.
///
/// # Example
/// ```
/// use tether_core::{impl_shallow_eq, ShallowEq};
///
/// #[derive(Clone)]
/// struct Counter {
///     count: i64,
///     text: String,
/// }
/// impl_shallow_eq!(Counter { count, text });
///
/// #[derive(Clone, PartialEq)]
/// enum Theme { Light, Dark }
/// impl_shallow_eq!(by_eq: Theme);
///
/// let a = Counter { count: 1, text: "a".into() };
/// let b = Counter { count: 1, text: "a".into() };
/// assert!(a.shallow_eq(&b));
/// assert!(Theme::Dark.shallow_eq(&Theme::Dark));
/// assert!(!Theme::Dark.shallow_eq(&Theme::Light));
/// ```
#[macro_export]
macro_rules! impl_shallow_eq {
    (by_eq: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ShallowEq for $ty {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl $crate::Identical for $ty {
                #[inline]
                fn identical(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )+
    };
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::ShallowEq for $ty {
            fn shallow_eq(&self, other: &Self) -> bool {
                $( $crate::Identical::identical(&self.$field, &other.$field) )&&+
            }
        }
    };
}

impl_shallow_eq!(by_eq:
    (), bool, char,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    String, str
);

impl<T: Identical + ?Sized> Identical for &T {
    fn identical(&self, other: &Self) -> bool {
        (**self).identical(*other)
    }
}

// Shared pointers fall back to identity.

impl<T: ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identical for Arc<T> {
    fn identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for Rc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identical for Rc<T> {
    fn identical(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        shallow_equal(self.as_ref(), other.as_ref())
    }
}

impl<T: Identical> Identical for Option<T> {
    fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.identical(b),
            _ => false,
        }
    }
}

// Sequences: same length, elements identical pairwise.

impl<T: Identical> ShallowEq for [T] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.identical(b))
    }
}

impl<T: Identical> ShallowEq for Vec<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_slice().shallow_eq(other.as_slice())
    }
}

impl<T: Identical, const N: usize> ShallowEq for [T; N] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_slice().shallow_eq(other.as_slice())
    }
}

// Maps: same key set, values identical per key.

impl<K, V, S> ShallowEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Identical,
    S: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.identical(o)))
    }
}

impl<K, V, S> ShallowEq for IndexMap<K, V, S>
where
    K: Eq + Hash,
    V: Identical,
    S: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.identical(o)))
    }
}

impl<K: Ord, V: Identical> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.identical(o)))
    }
}

// Tuples behave like small records: a projection such as `(count, text)`
// compares its components one level deep.

macro_rules! tuple_shallow_eq {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Identical),+> ShallowEq for ($($name,)+) {
            fn shallow_eq(&self, other: &Self) -> bool {
                $( self.$idx.identical(&other.$idx) )&&+
            }
        }

        impl<$($name: Identical),+> Identical for ($($name,)+) {
            fn identical(&self, other: &Self) -> bool {
                $( self.$idx.identical(&other.$idx) )&&+
            }
        }
    };
}

tuple_shallow_eq!(A: 0);
tuple_shallow_eq!(A: 0, B: 1);
tuple_shallow_eq!(A: 0, B: 1, C: 2);
tuple_shallow_eq!(A: 0, B: 1, C: 2, D: 3);

/// Untyped JSON values: arrays and objects are compared one level deep.
///
/// JSON values are owned trees without identity, so nested arrays and objects
/// are compared by value.
impl ShallowEq for serde_json::Value {
    fn shallow_eq(&self, other: &Self) -> bool {
        use serde_json::Value;

        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            _ => self == other,
        }
    }
}

impl Identical for serde_json::Value {
    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}
