//! Callable values: user-declared functions (with closures) and native
//! functions implemented in Rust.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::interpreter::{Exec, Interpreter, Signal};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Rust implementation of a native. Errors are plain messages; the call
/// site decorates them with the source position of the call.
pub type NativeFn = Box<dyn Fn(&mut Interpreter, &[Value]) -> Result<Value, String>>;

/// A function provided by the runtime rather than the guest program,
/// including the bound methods of built-in data types.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: usize, func: NativeFn) -> Rc<Self> {
        Rc::new(NativeFunction { name, arity, func })
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A user function: shared declaration plus the environment captured at
/// declaration time. Methods carry an initializer flag so constructors can
/// enforce their special return rule.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this method whose closure pre-defines `this` as the
    /// given instance. The fresh scope chains to the original closure, so
    /// each binding is independent.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        debug!(
            "Binding method '{}' to an instance of {}",
            self.declaration.name.lexeme,
            instance.borrow().class.name
        );

        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));

        env.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(env)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke the function body in a fresh child of the closure. A `Return`
    /// signal is caught here and nowhere else; normal completion yields
    /// `nil`. Initializers always yield `this`, whatever the body did.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Exec<Value> {
        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            env.define(&param.lexeme, argument);
        }

        let result = interpreter.execute_block(&self.declaration.body, env);

        match result {
            Ok(()) => {
                if self.is_initializer {
                    return Ok(self.bound_this());
                }

                Ok(Value::Nil)
            }

            Err(Signal::Return(value)) => {
                if self.is_initializer {
                    return Ok(self.bound_this());
                }

                Ok(value)
            }

            Err(other) => Err(other),
        }
    }

    /// The `this` an initializer must return. Only called on bound
    /// initializers, whose closure defines `this` at distance zero.
    fn bound_this(&self) -> Value {
        Environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Nil)
    }
}
