//! Composite sort-key codec.
//!
//! [`SortField`] is the key shape used by the ordered indices: a closed set
//! of variants over unsigned integers, strings, and fixed-arity tuples of
//! fields. Tuples compare component-wise in order with the first difference
//! deciding, which is what lets an index key on `(count, id)` stay unique
//! even when two records share a count.
//!
//! ## Key Components
//!
//! - [`SortField::Uint`]: unsigned integer field
//! - [`SortField::Str`]: string field (cheaply cloneable, `Arc`-backed)
//! - [`SortField::Tuple`]: lexicographic composition of fields
//!
//! Comparing fields of different shapes (or tuples of different arity) is a
//! programming error, not a runtime condition: it panics with a message
//! naming both shapes. Keys that meet in one index are always built by the
//! same constructor, so a mismatch can only mean a caller bug.
//!
//! ## Example Usage
//!
//! ```
//! use topkit::ds::SortField;
//!
//! let a = SortField::tuple([SortField::uint(3), SortField::str("apple")]);
//! let b = SortField::tuple([SortField::uint(3), SortField::str("banana")]);
//!
//! // Equal leading component: the second component decides.
//! assert!(a < b);
//! ```
//!
//! Shape mismatches fail loudly:
//!
//! ```should_panic
//! use topkit::ds::SortField;
//!
//! // uint vs str is a caller bug, not an ordering question
//! let _ = SortField::uint(1) < SortField::str("one");
//! ```

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A totally ordered, hashable sort field.
///
/// The closed variant set keeps ordering policy out of the tree code: an
/// ordered index stores `SortField` keys and knows nothing about counts,
/// timestamps, or identities.
#[derive(Debug, Clone)]
pub enum SortField {
    /// Unsigned integer field.
    Uint(u64),
    /// String field.
    Str(Arc<str>),
    /// Fixed-arity tuple of fields, compared lexicographically.
    Tuple(Box<[SortField]>),
}

impl SortField {
    /// Builds an unsigned integer field.
    #[inline]
    pub fn uint(value: u64) -> Self {
        SortField::Uint(value)
    }

    /// Builds a string field.
    #[inline]
    pub fn str(value: impl Into<Arc<str>>) -> Self {
        SortField::Str(value.into())
    }

    /// Builds a tuple field from its components.
    ///
    /// # Example
    ///
    /// ```
    /// use topkit::ds::SortField;
    ///
    /// let key = SortField::tuple([SortField::uint(7), SortField::str("id")]);
    /// assert_eq!(key, SortField::tuple([SortField::uint(7), SortField::str("id")]));
    /// ```
    #[inline]
    pub fn tuple(fields: impl IntoIterator<Item = SortField>) -> Self {
        SortField::Tuple(fields.into_iter().collect())
    }

    fn kind(&self) -> &'static str {
        match self {
            SortField::Uint(_) => "uint",
            SortField::Str(_) => "str",
            SortField::Tuple(_) => "tuple",
        }
    }
}

impl Ord for SortField {
    /// Compares two fields of the same shape.
    ///
    /// # Panics
    ///
    /// Panics when the shapes differ or tuple arities differ. This is a
    /// defect guard: keys in one index are always built the same way.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortField::Uint(a), SortField::Uint(b)) => a.cmp(b),
            (SortField::Str(a), SortField::Str(b)) => a.as_ref().cmp(b.as_ref()),
            (SortField::Tuple(a), SortField::Tuple(b)) => {
                if a.len() != b.len() {
                    panic!(
                        "cannot compare tuple fields of arity {} and {}",
                        a.len(),
                        b.len()
                    );
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.cmp(y) {
                        Ordering::Equal => continue,
                        decided => return decided,
                    }
                }
                Ordering::Equal
            }
            (a, b) => panic!("cannot compare {} field with {} field", a.kind(), b.kind()),
        }
    }
}

impl PartialOrd for SortField {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortField {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortField {}

impl Hash for SortField {
    /// Order-sensitive hash: the variant tag and, for tuples, the component
    /// positions all feed the hasher stream.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SortField::Uint(value) => {
                state.write_u8(0);
                state.write_u64(*value);
            }
            SortField::Str(value) => {
                state.write_u8(1);
                value.as_ref().hash(state);
            }
            SortField::Tuple(fields) => {
                state.write_u8(2);
                state.write_usize(fields.len());
                for field in fields.iter() {
                    field.hash(state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(field: &SortField) -> u64 {
        let mut hasher = DefaultHasher::new();
        field.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn uint_orders_numerically() {
        assert!(SortField::uint(2) < SortField::uint(10));
        assert_eq!(SortField::uint(7), SortField::uint(7));
    }

    #[test]
    fn str_orders_lexicographically() {
        assert!(SortField::str("alpha") < SortField::str("beta"));
        assert!(SortField::str("ab") < SortField::str("b"));
        assert_eq!(SortField::str("x"), SortField::str("x"));
    }

    #[test]
    fn tuple_first_difference_decides() {
        let a = SortField::tuple([SortField::uint(1), SortField::str("zzz")]);
        let b = SortField::tuple([SortField::uint(2), SortField::str("aaa")]);
        assert!(a < b);
    }

    #[test]
    fn tuple_tie_falls_through_to_next_component() {
        let a = SortField::tuple([SortField::uint(5), SortField::str("a")]);
        let b = SortField::tuple([SortField::uint(5), SortField::str("b")]);
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn tuple_equality_is_component_wise() {
        let a = SortField::tuple([SortField::uint(5), SortField::str("a")]);
        let b = SortField::tuple([SortField::uint(5), SortField::str("a")]);
        assert_eq!(a, b);
    }

    #[test]
    fn equal_fields_hash_equal() {
        let a = SortField::tuple([SortField::uint(5), SortField::str("a")]);
        let b = SortField::tuple([SortField::uint(5), SortField::str("a")]);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn hash_is_order_sensitive() {
        let a = SortField::tuple([SortField::uint(1), SortField::uint(2)]);
        let b = SortField::tuple([SortField::uint(2), SortField::uint(1)]);
        assert_ne!(hash_of(&a), hash_of(&b));
    }

    #[test]
    #[should_panic(expected = "cannot compare uint field with str field")]
    fn mismatched_shapes_panic() {
        let _ = SortField::uint(1).cmp(&SortField::str("one"));
    }

    #[test]
    #[should_panic(expected = "cannot compare tuple fields of arity 1 and 2")]
    fn mismatched_tuple_arity_panics() {
        let a = SortField::tuple([SortField::uint(1)]);
        let b = SortField::tuple([SortField::uint(1), SortField::uint(2)]);
        let _ = a.cmp(&b);
    }

    #[test]
    #[should_panic(expected = "cannot compare")]
    fn mismatch_inside_tuple_panics() {
        let a = SortField::tuple([SortField::uint(1)]);
        let b = SortField::tuple([SortField::str("1")]);
        let _ = a.cmp(&b);
    }
}
