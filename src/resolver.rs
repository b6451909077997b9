//! Static resolution pass.
//!
//! One AST walk that:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>` tracking
//!    declared (false) and fully defined (true) names per nested block or
//!    function.
//! 2. **Enforces static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside functions, `this`
//!    and `super` outside their class contexts, self-inheritance.
//! 3. **Records binding distances**: every `Variable`, `Assign`, `This` and
//!    `Super` occurrence is noted in the interpreter's depth map (or left
//!    global), enabling direct environment-frame access at runtime.
//!
//! Errors recover per statement: each is reported through the host and
//! resolution continues, so a single mistake does not hide the rest. Any
//! reported error blocks execution afterwards.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::expr::Expr;
use crate::host::Host;
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body we are inside. Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body we are inside. Validates `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'i, 'h> {
    interpreter: &'i mut Interpreter,
    host: &'h dyn Host,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    had_error: bool,
}

impl<'i, 'h> Resolver<'i, 'h> {
    pub fn new(interpreter: &'i mut Interpreter, host: &'h dyn Host) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            host,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            had_error: false,
        }
    }

    /// Walk all top-level statements. Returns true if any static error was
    /// reported.
    pub fn resolve(mut self, statements: &[Stmt]) -> bool {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        self.had_error
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            if let Err(e) = self.resolve_stmt(stmt) {
                self.had_error = true;

                if let Some((line, column)) = e.position() {
                    self.host.parse_error(line, column, e.message());
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                self.resolve_stmts(statements);

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name)?;

                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Declared and defined immediately so the body can recurse.
                self.declare(&declaration.name)?;
                self.define(&declaration.name);

                self.resolve_function(FunctionType::Function, declaration)?;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr)?;
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;

                self.resolve_stmt(then_branch)?;

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;

                self.resolve_stmt(body)?;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(self.error(keyword, "Can't return from top-level code."));
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        return Err(
                            self.error(keyword, "Can't return a value from an initializer.")
                        );
                    }

                    self.resolve_expr(expr)?;
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.resolve_class(name, superclass.as_ref(), methods)?;
            }
        }

        Ok(())
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Token>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        self.declare(name)?;
        self.define(name);

        if let Some(super_token) = superclass {
            if super_token.lexeme == name.lexeme {
                return Err(self.error(super_token, "A class can't inherit from itself."));
            }
        }

        let enclosing_class = self.current_class;

        self.current_class = if superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        let result = self.resolve_class_body(superclass, methods);

        // Scopes and context restore on the error path too, so one bad
        // class cannot poison the statements after it.
        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;

        result
    }

    /// Scope layout: an optional `super` scope wraps the `this` scope, which
    /// wraps every method body. Both are opened here and closed by the
    /// caller.
    fn resolve_class_body(
        &mut self,
        superclass: Option<&Token>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        if let Some(super_token) = superclass {
            // The superclass name is an ordinary variable read.
            self.resolve_local(super_token);

            self.begin_scope();

            self.scopes
                .last_mut()
                .expect("scope just pushed")
                .insert("super".to_string(), true);
        }

        self.begin_scope();

        self.scopes
            .last_mut()
            .expect("scope just pushed")
            .insert("this".to_string(), true);

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(kind, method)?;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner)?;
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right)?;
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Variable(name) => {
                // Reading a variable inside its own initializer is the one
                // place where "declared but not defined" is observable.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        return Err(self.error(
                            name,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(name);
            }

            Expr::Assign { name, value } => {
                self.resolve_expr(value)?;

                self.resolve_local(name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;

                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object)?;
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)?;
            }

            Expr::GetIndex { object, key, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(key)?;
            }

            Expr::SetIndex {
                object,
                key,
                value,
                ..
            } => {
                self.resolve_expr(object)?;
                self.resolve_expr(key)?;
                self.resolve_expr(value)?;
            }

            Expr::List { elements, .. } => {
                for element in elements {
                    self.resolve_expr(element)?;
                }
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    return Err(self.error(keyword, "Can't use 'this' outside of a class."));
                }

                self.resolve_local(keyword);
            }

            Expr::Super { keyword, .. } => {
                if self.current_class == ClassType::None {
                    return Err(self.error(keyword, "Can't use 'super' outside of a class."));
                }

                if self.current_class != ClassType::Subclass {
                    return Err(
                        self.error(keyword, "Can't use 'super' in a class with no superclass.")
                    );
                }

                self.resolve_local(keyword);
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters plus body, resolving
    /// both under the given context.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &FunctionDecl) -> Result<()> {
        let enclosing = self.current_function;

        self.current_function = kind;

        self.begin_scope();

        let mut result = Ok(());

        for param in &declaration.params {
            result = self.declare(param);

            if result.is_err() {
                break;
            }

            self.define(param);
        }

        if result.is_ok() {
            self.resolve_stmts(&declaration.body);
        }

        self.end_scope();

        self.current_function = enclosing;

        result
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) -> Result<()> {
        // Global redeclaration is allowed; same-scope local redeclaration
        // is not.
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(self.error(
                    name,
                    "Already a variable with this name in this scope.",
                ));
            }

            scope.insert(name.lexeme.clone(), false);
        }

        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at some depth, or leave it for the
    /// globals environment if no scope binds the name.
    fn resolve_local(&mut self, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.resolve(name.id, depth);

                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error(&self, token: &Token, message: &str) -> LoxError {
        LoxError::resolve(token.line, token.column, message)
    }
}
