//! Conversion between scope sets and the delimited scope strings providers expect.
//!
//! Providers disagree on how multiple scopes are encoded: some separate them with a
//! space, others with a comma or a `+`.

use std::collections::{BTreeSet, HashSet};

/// A scope as handed to the conversion helpers: already encoded, a collection of
/// individual scopes, or not set at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scopes {
    Unset,
    Encoded(String),
    Set(BTreeSet<String>),
}

impl From<&str> for Scopes {
    fn from(scope: &str) -> Self {
        Scopes::Encoded(scope.to_string())
    }
}

impl From<String> for Scopes {
    fn from(scope: String) -> Self {
        Scopes::Encoded(scope)
    }
}

impl From<BTreeSet<String>> for Scopes {
    fn from(scopes: BTreeSet<String>) -> Self {
        Scopes::Set(scopes)
    }
}

impl From<&BTreeSet<String>> for Scopes {
    fn from(scopes: &BTreeSet<String>) -> Self {
        Scopes::Set(scopes.clone())
    }
}

impl From<HashSet<String>> for Scopes {
    fn from(scopes: HashSet<String>) -> Self {
        Scopes::Set(scopes.into_iter().collect())
    }
}

impl From<Vec<String>> for Scopes {
    fn from(scopes: Vec<String>) -> Self {
        Scopes::Set(scopes.into_iter().collect())
    }
}

impl From<&[&str]> for Scopes {
    fn from(scopes: &[&str]) -> Self {
        Scopes::Set(scopes.iter().map(|scope| scope.to_string()).collect())
    }
}

impl<T: Into<Scopes>> From<Option<T>> for Scopes {
    fn from(scope: Option<T>) -> Self {
        scope.map_or(Scopes::Unset, Into::into)
    }
}

/// Encodes `scopes` into a single scope string.
///
/// Encoded input passes through untouched. Collections are joined with `delimiter`
/// in sorted order, so the same set always produces the same string.
pub fn scope_to_string(scopes: impl Into<Scopes>, delimiter: &str) -> Option<String> {
    match scopes.into() {
        Scopes::Unset => None,
        Scopes::Encoded(scope) => Some(scope),
        Scopes::Set(scopes) => {
            let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
            Some(scopes.join(delimiter))
        }
    }
}

/// Splits `scope` into the individual scopes it is made of.
pub fn scope_to_set(scope: impl Into<Scopes>, delimiter: &str) -> BTreeSet<String> {
    match scope.into() {
        Scopes::Unset => BTreeSet::new(),
        Scopes::Set(scopes) => scopes,
        Scopes::Encoded(scope) => scope
            .trim()
            .split(delimiter)
            .filter(|scope| !scope.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Whether `old` already grants everything in `new`. Both sides are decoded with
/// the default space delimiter.
pub fn has_sufficient_scope(old: impl Into<Scopes>, new: impl Into<Scopes>) -> bool {
    scope_to_set(new, " ").is_subset(&scope_to_set(old, " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn set(scopes: &[&str]) -> BTreeSet<String> {
        scopes.iter().map(|scope| scope.to_string()).collect()
    }

    #[test]
    fn joins_sets_in_sorted_order() {
        let scopes = set(&["second", "first"]);
        assert_eq!(
            scope_to_string(&scopes, " "),
            Some("first second".to_string())
        );
        assert_eq!(
            scope_to_string(&scopes, "+"),
            Some("first+second".to_string())
        );
        assert_eq!(
            scope_to_string(vec!["b".to_string(), "a".to_string()], " "),
            Some("a b".to_string())
        );
    }

    #[test]
    fn encoded_scope_passes_through() {
        assert_eq!(
            scope_to_string("first+second", " "),
            Some("first+second".to_string())
        );
        assert_eq!(scope_to_string(None::<String>, " "), None);
        assert_eq!(
            scope_to_string(BTreeSet::<String>::new(), ","),
            Some(String::new())
        );
    }

    #[test]
    fn scope_containing_delimiter_is_joined_as_is() {
        let scopes = set(&["a b", "c"]);
        assert_eq!(scope_to_string(&scopes, " "), Some("a b c".to_string()));
        // Such a set does not survive decoding
        assert_eq!(scope_to_set("a b c", " "), set(&["a", "b", "c"]));
    }

    #[test_case("first+second", " ", &["first+second"])]
    #[test_case("first+second", "+", &["first", "second"])]
    #[test_case("  a,b ", ",", &["a", "b"])]
    #[test_case("", " ", &[])]
    fn splits_encoded_scope(scope: &str, delimiter: &str, expected: &[&str]) {
        assert_eq!(scope_to_set(scope, delimiter), set(expected));
    }

    #[test]
    fn collections_are_returned_as_sets() {
        assert_eq!(
            scope_to_set(vec!["a".to_string(), "b".to_string(), "a".to_string()], "--"),
            set(&["a", "b"])
        );
        assert_eq!(scope_to_set(Scopes::Unset, "--"), BTreeSet::new());
        assert_eq!(scope_to_set(Vec::<String>::new(), "--"), BTreeSet::new());
    }

    #[test_case(",")]
    #[test_case(" ")]
    #[test_case("+")]
    fn string_and_set_round_trip(delimiter: &str) {
        let scopes = set(&["activity:read", "profile:read_all", "base"]);
        let encoded = scope_to_string(&scopes, delimiter).unwrap();
        assert_eq!(scope_to_set(encoded, delimiter), scopes);
    }

    #[test_case("scope1 scope2 scope3", "scope1 scope2 scope3", true)]
    #[test_case("scope1 scope2 scope3", "scope2 scope1", true)]
    #[test_case("scope1 scope2", "scope1 scope2 scope3", false)]
    #[test_case("", "scope1", false)]
    #[test_case("scope1", "", true)]
    fn sufficient_scope(old: &str, new: &str, expected: bool) {
        assert_eq!(has_sufficient_scope(old, new), expected);
    }

    #[test]
    fn sufficient_scope_accepts_sets() {
        let granted = set(&["scope1", "scope2"]);
        let requested: &[&str] = &["scope1"];
        assert!(has_sufficient_scope(&granted, requested));
        assert!(!has_sufficient_scope(requested, &granted));
    }
}
