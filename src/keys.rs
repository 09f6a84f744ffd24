//! Typed Keys

use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// A string identifier tagged with the kind of record it identifies.
///
/// Identifiers coming back from the data service are opaque strings; the tag
/// keeps an application id from being passed where a subsidiary code is due.
pub struct TypedKey<T>(String, PhantomData<fn() -> T>);

impl<T> TypedKey<T> {
    /// Create a key from anything string-like.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into(), PhantomData)
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the raw identifier.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<T> Clone for TypedKey<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T> Debug for TypedKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedKey<T> {}

impl<T> Hash for TypedKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedKey<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedKey<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Borrow<str> for TypedKey<T> {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<T> AsRef<str> for TypedKey<T> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<T> From<&str> for TypedKey<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for TypedKey<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;

    struct Marker;

    #[test]
    fn keys_compare_by_value() {
        let a: TypedKey<Marker> = "ACME".into();
        let b: TypedKey<Marker> = TypedKey::new(String::from("ACME"));

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "ACME");
    }

    #[test]
    fn keys_can_be_looked_up_by_str() {
        let mut set: FxHashSet<TypedKey<Marker>> = FxHashSet::default();

        set.insert("DE01".into());

        assert!(set.contains("DE01"));
        assert!(!set.contains("FR02"));
    }
}
