//! Runtime scope containers.
//!
//! One `Scope` is materialized per activation, holding that activation's
//! parameters and locals. It is created exactly once, shared by handle
//! with stack frames and closures, and mutated in place as the program
//! advances.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::value::Value;

pub type ScopeRef = Rc<RefCell<Scope>>;

/// Ordered name -> value mapping for one activation.
pub struct Scope {
    entries: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope { entries: vec![] }
    }

    pub fn into_shared(self) -> ScopeRef {
        Rc::new(RefCell::new(self))
    }

    /// Introduce a name, overwriting any previous binding of it.
    pub fn declare(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Update an existing binding; false when the name is not declared here.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
            true
        } else {
            false
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.entries {
            map.entry(name, value);
        }
        map.finish()
    }
}
