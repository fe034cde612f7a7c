//! Variable table, fixed-variable set and display renames.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Names pre-declared in every scope. They are never reported as free variables.
pub const BUILTIN_CONSTANTS: [(&str, f64); 2] =
    [("pi", std::f64::consts::PI), ("e", std::f64::consts::E)];

pub fn is_builtin_constant(name: &str) -> bool {
    BUILTIN_CONSTANTS.iter().any(|(constant, _)| *constant == name)
}

/// Variable values keyed by lower-cased name.
///
/// Declaration does no validation; the owning expression checks names first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    values: HashMap<String, f64>,
    /// Declaration order
    order: Vec<String>,
    fixed: HashSet<String>,
    renames: HashMap<String, String>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// A scope holding only the built-in constants.
    pub fn new() -> Self {
        let mut scope = Self {
            values: HashMap::new(),
            order: Vec::new(),
            fixed: HashSet::new(),
            renames: HashMap::new(),
        };
        for (name, value) in BUILTIN_CONSTANTS {
            scope.declare(name, value);
        }
        scope
    }

    /// Declare or overwrite a variable. Resets its display name to itself.
    pub fn declare(&mut self, name: &str, value: f64) {
        let key = name.to_lowercase();
        if self.values.insert(key.clone(), value).is_none() {
            self.order.push(key.clone());
        }
        self.renames.insert(key.clone(), key);
    }

    pub fn mark_fixed(&mut self, name: &str) {
        self.fixed.insert(name.to_lowercase());
    }

    pub fn rename(&mut self, name: &str, display: &str) {
        self.renames.insert(name.to_lowercase(), display.to_string());
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(&name.to_lowercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_lowercase())
    }

    pub fn is_fixed(&self, name: &str) -> bool {
        self.fixed.contains(&name.to_lowercase())
    }

    pub fn display_name(&self, name: &str) -> Option<&str> {
        self.renames.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Declared names in declaration order, built-in constants first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod scope_tests {
    use super::*;

    #[test]
    fn test_new_scope_has_constants() {
        let scope = Scope::new();
        assert_eq!(scope.value("pi"), Some(std::f64::consts::PI));
        assert_eq!(scope.value("E"), Some(std::f64::consts::E));
        assert_eq!(scope.names().collect::<Vec<_>>(), vec!["pi", "e"]);
    }

    #[test]
    fn test_declare_is_case_insensitive() {
        let mut scope = Scope::new();
        scope.declare("Width", 4.0);
        assert_eq!(scope.value("width"), Some(4.0));
        assert_eq!(scope.value("WIDTH"), Some(4.0));
        assert!(scope.contains("wIdTh"));
    }

    #[test]
    fn test_redeclare_overwrites_and_resets_rename() {
        let mut scope = Scope::new();
        scope.declare("x", 1.0);
        scope.rename("x", "length");
        assert_eq!(scope.display_name("x"), Some("length"));

        scope.declare("X", 2.0);
        assert_eq!(scope.value("x"), Some(2.0));
        assert_eq!(scope.display_name("x"), Some("x"));
        assert_eq!(scope.len(), 3);
    }

    #[test]
    fn test_rename_of_undeclared_name() {
        let mut scope = Scope::new();
        scope.rename("ghost", "spirit");
        assert_eq!(scope.display_name("ghost"), Some("spirit"));
        assert!(!scope.contains("ghost"));
    }

    #[test]
    fn test_fixed_membership() {
        let mut scope = Scope::new();
        scope.declare("y", 5.0);
        assert!(!scope.is_fixed("y"));
        scope.mark_fixed("Y");
        assert!(scope.is_fixed("y"));
    }

    #[test]
    fn test_builtin_constant_check() {
        assert!(is_builtin_constant("pi"));
        assert!(is_builtin_constant("e"));
        assert!(!is_builtin_constant("x"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut scope = Scope::new();
        scope.declare("x", 5.0);
        scope.mark_fixed("x");
        scope.rename("x", "span");

        let json = serde_json::to_string(&scope).unwrap();
        let restored: Scope = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value("x"), Some(5.0));
        assert!(restored.is_fixed("x"));
        assert_eq!(restored.display_name("x"), Some("span"));
        assert_eq!(restored.names().collect::<Vec<_>>(), vec!["pi", "e", "x"]);
    }
}
