use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// One node of the lexical scope chain: a name-to-value map plus an optional
/// link to the enclosing scope. Nodes are shared (`Rc<RefCell<..>>`) because
/// closures keep their defining environment alive past block exit.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a name in this scope. Always lands in the innermost map, even if
    /// an enclosing scope already binds the name.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Read a name, consulting this scope first and then the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite an existing binding, walking the chain to find it. Returns
    /// false if no scope binds the name.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);

            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// The environment exactly `distance` hops up the chain.
    ///
    /// The resolver guarantees the chain is deep enough for every distance it
    /// hands out, so a short chain here is an interpreter defect.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.as_ref().map(Rc::clone)?;

            current = next;
        }

        Some(current)
    }

    /// Read a name from the environment `distance` hops up.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        let target = Environment::ancestor(env, distance)?;

        let value = target.borrow().values.get(name).cloned();

        value
    }

    /// Write a name in the environment `distance` hops up. Returns false if
    /// the chain is too short or the binding is missing there.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Environment::ancestor(env, distance) {
            Some(target) => {
                let mut target = target.borrow_mut();

                if target.values.contains_key(name) {
                    target.values.insert(name.to_string(), value);

                    true
                } else {
                    false
                }
            }

            None => false,
        }
    }
}
