//! Expression rewriting.
//!
//! Column references are substituted by walking the whole expression tree
//! with sqlparser's mutable visitor, so identifiers nested inside function
//! arguments, operators, CASE branches and subqueries are all reached.
//! Literals and output aliases are not expressions of column kind and are
//! never touched.

use std::collections::HashMap;
use std::ops::ControlFlow;

use sqlparser::ast::{visit_expressions_mut, Expr, Function, Ident, VisitMut};

/// Case-insensitive name mapping.
///
/// Keys are looked up lower-cased; values keep their original spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldNameMap {
    entries: HashMap<String, (String, String)>,
}

impl FieldNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping. A later insert for the same key (ignoring case) wins.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        self.entries.insert(from.to_lowercase(), (from, to.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_lowercase())
            .map(|(_, to)| to.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// The reverse mapping (values become keys).
    pub fn inverse(&self) -> FieldNameMap {
        self.iter().map(|(from, to)| (to, from)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldNameMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldNameMap::new();
        for (from, to) in iter {
            map.insert(from, to);
        }
        map
    }
}

fn rename_ident(ident: &mut Ident, map: &FieldNameMap) {
    if let Some(to) = map.get(&ident.value) {
        ident.value = to.to_string();
    }
}

/// Replace every column identifier under `node` with its mapped name.
///
/// Unmapped columns pass through unchanged.
pub fn rewrite_fields<V: VisitMut>(node: &mut V, map: &FieldNameMap) {
    if map.is_empty() {
        return;
    }
    let _ = visit_expressions_mut(node, |expr| {
        match expr {
            Expr::Identifier(ident) => rename_ident(ident, map),
            Expr::CompoundIdentifier(parts) => {
                if let Some(last) = parts.last_mut() {
                    rename_ident(last, map);
                }
            }
            _ => {}
        }
        ControlFlow::<()>::Continue(())
    });
}

/// Rename function calls under `node` using `remap`, which receives the
/// function name as written and returns the replacement, if any.
pub fn rename_functions<V, F>(node: &mut V, mut remap: F)
where
    V: VisitMut,
    F: FnMut(&str) -> Option<&'static str>,
{
    let _ = visit_expressions_mut(node, |expr| {
        if let Expr::Function(func) = expr {
            rename_function(func, &mut remap);
        }
        ControlFlow::<()>::Continue(())
    });
}

/// Rename a single call. Returns whether the name changed.
pub fn rename_function<F>(func: &mut Function, remap: F) -> bool
where
    F: FnOnce(&str) -> Option<&'static str>,
{
    let current = func.name.to_string();
    match remap(&current) {
        Some(name) if name != current => {
            func.name.0 = vec![Ident::new(name)];
            true
        }
        _ => false,
    }
}
