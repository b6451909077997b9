//! Tree-walking interpreter.
//!
//! Executes statements against the lexically nested environment chain, using
//! the resolver's binding-depth map for variable access. Non-local control
//! flow (`return`, runtime errors, cancellation) travels as a typed
//! [`Signal`] so each kind unwinds to exactly the boundary that owns it:
//! `Return` to the enclosing function call, everything else to the `run`
//! pipeline.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::LoxFunction;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::{Expr, LiteralValue};
use crate::host::{CancelToken, Host};
use crate::list::{self, LoxList};
use crate::natives;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{is_equal, Value};

/// Non-local exit raised during execution.
#[derive(Debug)]
pub enum Signal {
    /// `return` from a function body; caught only at the call boundary.
    Return(Value),

    /// Runtime error; aborts the current run.
    Error(LoxError),

    /// The host's cancellation signal fired; unwind cleanly.
    Cancelled,
}

/// Result alias for everything that can observe a [`Signal`].
pub type Exec<T> = std::result::Result<T, Signal>;

/// How a completed `interpret` call ended, errors aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Binding depths keyed by token occurrence id, written by the resolver.
    locals: HashMap<usize, usize>,
    host: Rc<dyn Host>,
    cancel: CancelToken,
}

impl Interpreter {
    pub fn new(host: Rc<dyn Host>, cancel: CancelToken) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();

        natives::define_globals(&mut globals);

        let globals = Rc::new(RefCell::new(globals));

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            host,
            cancel,
        }
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn cancel(&self) -> &CancelToken {
        &self.cancel
    }

    /// Record a binding depth for a token occurrence. Resolver callback.
    pub fn resolve(&mut self, token_id: usize, depth: usize) {
        debug!("Recording depth {} for token occurrence {}", depth, token_id);

        self.locals.insert(token_id, depth);
    }

    /// Execute a whole program. Runtime errors are reported through the host
    /// and returned; cancellation ends the run without a diagnostic.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<RunOutcome, LoxError> {
        for stmt in statements {
            if self.cancel.is_cancelled() {
                info!("Run cancelled before statement execution");

                return Ok(RunOutcome::Cancelled);
            }

            match self.execute(stmt) {
                Ok(()) => {}

                Err(Signal::Cancelled) => return Ok(RunOutcome::Cancelled),

                // The resolver rejects top-level `return`, so a stray signal
                // here is an interpreter defect; swallowing it beats lying
                // to the user with a phantom diagnostic.
                Err(Signal::Return(_)) => {}

                Err(Signal::Error(e)) => {
                    if let Some((line, column)) = e.position() {
                        self.host.runtime_error(line, column, e.message());
                    }

                    return Err(e);
                }
            }
        }

        Ok(RunOutcome::Completed)
    }

    /// Evaluate a single expression (the `evaluate` debug mode), reporting
    /// any runtime error through the host.
    pub fn interpret_expression(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),

            Err(Signal::Error(e)) => {
                if let Some((line, column)) = e.position() {
                    self.host.runtime_error(line, column, e.message());
                }

                Err(e)
            }

            Err(Signal::Return(value)) => Ok(value),

            Err(Signal::Cancelled) => Ok(Value::Nil),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                self.host.print(&value.to_string());

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                loop {
                    if self.cancel.is_cancelled() {
                        info!("Run cancelled inside loop");

                        return Err(Signal::Cancelled);
                    }

                    if !self.evaluate(condition)?.is_truthy() {
                        break;
                    }

                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                Err(Signal::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Token>,
        methods: &[Rc<FunctionDecl>],
    ) -> Exec<()> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(super_token) => match self.look_up_variable(super_token)? {
                Value::Class(class) => Some(class),

                _ => return Err(self.error(super_token, "Superclass must be a class.")),
            },

            None => None,
        };

        // Pre-define the name so methods can reference their own class.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let previous = Rc::clone(&self.environment);

        if let Some(superclass) = &superclass_value {
            let mut env = Environment::with_enclosing(Rc::clone(&self.environment));

            env.define("super", Value::Class(Rc::clone(superclass)));

            self.environment = Rc::new(RefCell::new(env));
        }

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for method in methods {
            let is_initializer = method.name.lexeme == "init";

            let function = LoxFunction::new(
                Rc::clone(method),
                Rc::clone(&self.environment),
                is_initializer,
            );

            method_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        self.environment = previous;

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

        debug!("Defined class '{}'", class.name);

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    /// Run `statements` in `environment`, restoring the previous environment
    /// on every exit path: completion, runtime error, `return`, cancellation.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = Rc::new(RefCell::new(environment));

        let mut result: Exec<()> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),

                LiteralValue::Str(s) => Value::String(s.clone()),

                LiteralValue::True => Value::Bool(true),

                LiteralValue::False => Value::Bool(false),

                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                match operator.token_type {
                    TokenType::OR => {
                        if left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    _ => {
                        if !left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }

            Expr::Variable(name) => self.look_up_variable(name),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;

                let assigned = match self.locals.get(&name.id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self.globals.borrow_mut().assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(self.error(
                        name,
                        &format!("Undefined variable '{}'.", name.lexeme),
                    ));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());

                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.call_value(callee_val, arg_values, paren)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => LoxInstance::get(&instance, &name.lexeme)
                        .ok_or_else(|| {
                            self.error(
                                name,
                                &format!("Undefined property '{}'.", name.lexeme),
                            )
                        }),

                    Value::List(list) => list::bound_method(&list, &name.lexeme)
                        .map(Value::Native)
                        .ok_or_else(|| {
                            self.error(
                                name,
                                &format!("Undefined property '{}'.", name.lexeme),
                            )
                        }),

                    _ => Err(self.error(name, "Only instances have properties.")),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;

                        instance.borrow_mut().set(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(self.error(name, "Only instances have fields.")),
                }
            }

            Expr::GetIndex {
                object,
                key,
                bracket,
            } => {
                let object = self.evaluate(object)?;
                let key = self.evaluate(key)?;

                self.evaluate_index(object, key, bracket)
            }

            Expr::SetIndex {
                object,
                key,
                value,
                bracket,
            } => {
                let object = self.evaluate(object)?;
                let key = self.evaluate(key)?;

                match object {
                    Value::List(target) => {
                        let index = match key {
                            Value::Number(n) => n,

                            _ => return Err(self.error(bracket, "Index must be a number.")),
                        };

                        let slot = target
                            .borrow()
                            .normalize_index(index)
                            .ok_or_else(|| self.error(bracket, "Index out of bounds."))?;

                        let value = self.evaluate(value)?;

                        target.borrow_mut().elements[slot] = value.clone();

                        Ok(value)
                    }

                    _ => Err(self.error(bracket, "Only lists support index assignment.")),
                }
            }

            Expr::List { elements, .. } => {
                let mut values: Vec<Value> = Vec::with_capacity(elements.len());

                for element in elements {
                    values.push(self.evaluate(element)?);
                }

                Ok(Value::List(Rc::new(RefCell::new(LoxList::new(values)))))
            }

            Expr::This(keyword) => self.look_up_variable(keyword),

            Expr::Super { keyword, method } => self.evaluate_super(keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Exec<Value> {
        let value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(self.error(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(self.error(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                // One string operand stringifies the other.
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", left_val, right_val)))
                }

                (Value::List(a), Value::List(b)) => {
                    let mut combined: Vec<Value> = a.borrow().elements.clone();

                    combined.extend(b.borrow().elements.iter().cloned());

                    Ok(Value::List(Rc::new(RefCell::new(LoxList::new(combined)))))
                }

                _ => Err(self.error(operator, "Operands must be two numbers or two strings.")),
            },

            TokenType::MINUS => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(self.error(operator, "Operands must be numbers.")),
            },

            TokenType::STAR => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(self.error(operator, "Operands must be numbers.")),
            },

            TokenType::SLASH => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if *b == 0.0 {
                        Err(self.error(operator, "Division by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(self.error(operator, "Operands must be numbers.")),
            },

            TokenType::MOD => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if *b == 0.0 {
                        Err(self.error(operator, "Division by zero."))
                    } else {
                        Ok(Value::Number(a % b))
                    }
                }

                _ => Err(self.error(operator, "Operands must be numbers.")),
            },

            TokenType::GREATER => self.compare_numbers(&left_val, &right_val, operator, |a, b| a > b),

            TokenType::GREATER_EQUAL => {
                self.compare_numbers(&left_val, &right_val, operator, |a, b| a >= b)
            }

            TokenType::LESS => self.compare_numbers(&left_val, &right_val, operator, |a, b| a < b),

            TokenType::LESS_EQUAL => {
                self.compare_numbers(&left_val, &right_val, operator, |a, b| a <= b)
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            _ => Err(self.error(operator, "Invalid binary operator.")),
        }
    }

    fn compare_numbers(
        &self,
        left: &Value,
        right: &Value,
        operator: &Token,
        cmp: fn(f64, f64) -> bool,
    ) -> Exec<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(cmp(*a, *b))),

            _ => Err(self.error(operator, "Operands must be numbers.")),
        }
    }

    fn evaluate_index(&mut self, object: Value, key: Value, bracket: &Token) -> Exec<Value> {
        let index = match key {
            Value::Number(n) => n,

            _ => return Err(self.error(bracket, "Index must be a number.")),
        };

        match object {
            Value::List(list) => {
                let list = list.borrow();

                let slot = list
                    .normalize_index(index)
                    .ok_or_else(|| self.error(bracket, "Index out of bounds."))?;

                Ok(list.elements[slot].clone())
            }

            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();

                let mut slot = index as i64;

                if slot < 0 {
                    slot += chars.len() as i64;
                }

                if slot < 0 || slot as usize >= chars.len() {
                    return Err(self.error(bracket, "Index out of bounds."));
                }

                Ok(Value::String(chars[slot as usize].to_string()))
            }

            _ => Err(self.error(bracket, "Only lists and strings can be indexed.")),
        }
    }

    fn evaluate_super(&mut self, keyword: &Token, method: &Token) -> Exec<Value> {
        // The `this` scope always sits one level inside its `super` scope.
        let distance = match self.locals.get(&keyword.id) {
            Some(distance) => *distance,

            None => return Err(self.error(keyword, "Can't use 'super' here.")),
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,

            _ => return Err(self.error(keyword, "Can't use 'super' here.")),
        };

        let instance = match Environment::get_at(&self.environment, distance - 1, "this") {
            Some(Value::Instance(instance)) => instance,

            _ => return Err(self.error(keyword, "Can't use 'super' here.")),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(self.error(
                method,
                &format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls and variable access
    // ─────────────────────────────────────────────────────────────────────

    pub fn call_value(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Exec<Value> {
        match callee {
            Value::Native(native) => {
                if arguments.len() != native.arity {
                    return Err(self.arity_error(paren, native.arity, arguments.len()));
                }

                debug!("Calling native function '{}'", native.name);

                (native.func)(self, &arguments).map_err(|msg| self.error(paren, &msg))
            }

            Value::Function(function) => {
                if arguments.len() != function.arity() {
                    return Err(self.arity_error(paren, function.arity(), arguments.len()));
                }

                debug!("Calling function '{}'", function.declaration.name.lexeme);

                function.call(self, arguments)
            }

            Value::Class(class) => {
                if arguments.len() != class.arity() {
                    return Err(self.arity_error(paren, class.arity(), arguments.len()));
                }

                debug!("Instantiating class '{}'", class.name);

                let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

                if let Some(init) = class.find_method("init") {
                    init.bind(Rc::clone(&instance)).call(self, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(self.error(paren, "Can only call functions and classes.")),
        }
    }

    fn look_up_variable(&mut self, name: &Token) -> Exec<Value> {
        let found = match self.locals.get(&name.id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, &name.lexeme),

            None => self.globals.borrow().get(&name.lexeme),
        };

        found.ok_or_else(|| {
            self.error(name, &format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    fn arity_error(&self, paren: &Token, expected: usize, got: usize) -> Signal {
        self.error(
            paren,
            &format!("Expected {} arguments but got {}.", expected, got),
        )
    }

    fn error(&self, token: &Token, message: &str) -> Signal {
        Signal::Error(LoxError::runtime(token.line, token.column, message))
    }
}
