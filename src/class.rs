//! Classes and their instances. Method lookup walks the superclass chain;
//! property access binds methods to the receiving instance on the fly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::callable::LoxFunction;
use crate::value::Value;

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Look up a method on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Calling a class runs its `init`, so the class's arity is `init`'s.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }
}

/// A runtime object: its class plus a mutable field map.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: a field shadows a method of the same name. Methods
    /// come back bound to the receiver.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &str) -> Option<Value> {
        if let Some(field) = instance.borrow().fields.get(name) {
            return Some(field.clone());
        }

        let method = instance.borrow().class.find_method(name);

        method.map(|method| {
            debug!("Property '{}' resolved to a method", name);

            Value::Function(Rc::new(method.bind(Rc::clone(instance))))
        })
    }

    /// Property write. Fields spring into existence on first assignment.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
