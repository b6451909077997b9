//! treelox: a tree-walking interpreter for a dynamically typed, lexically
//! scoped, object-oriented scripting language in the Lox family.
//!
//! The pipeline is strictly sequential per source input:
//! scan -> parse -> resolve -> interpret. Compile-time diagnostics
//! accumulate and batch-fail; runtime errors fail fast; an external
//! [`host::CancelToken`] can end a run cleanly between statements.

pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod host;
pub mod interpreter;
pub mod list;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::rc::Rc;

use log::info;

use crate::ast_printer::AstPrinter;
use crate::host::{CancelToken, Host};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;

/// Exit code for scan, parse and resolve errors.
pub const COMPILE_ERROR_EXIT_CODE: i32 = 65;

/// Exit code for runtime errors.
pub const RUNTIME_ERROR_EXIT_CODE: i32 = 70;

/// Debug mode: print the token stream, one `KIND LEXEME LITERAL` line per
/// token.
pub fn tokenize(source: &[u8], host: Rc<dyn Host>) -> i32 {
    let (tokens, had_error) = scanner::scan(source, host.as_ref());

    for token in &tokens {
        host.print(&token.to_string());
    }

    if had_error {
        COMPILE_ERROR_EXIT_CODE
    } else {
        0
    }
}

/// Debug mode: parse a single expression and print its prefix form.
pub fn parse(source: &[u8], host: Rc<dyn Host>) -> i32 {
    let (tokens, scan_error) = scanner::scan(source, host.as_ref());

    if scan_error {
        return COMPILE_ERROR_EXIT_CODE;
    }

    match Parser::new(tokens, host.as_ref()).parse_expression() {
        Ok(expr) => {
            host.print(&AstPrinter::print(&expr));

            0
        }

        // The parser already reported the diagnostic.
        Err(_) => COMPILE_ERROR_EXIT_CODE,
    }
}

/// Debug mode: evaluate a single expression and print its value.
pub fn evaluate(source: &[u8], host: Rc<dyn Host>) -> i32 {
    let (tokens, scan_error) = scanner::scan(source, host.as_ref());

    if scan_error {
        return COMPILE_ERROR_EXIT_CODE;
    }

    let expr = match Parser::new(tokens, host.as_ref()).parse_expression() {
        Ok(expr) => expr,

        Err(_) => return COMPILE_ERROR_EXIT_CODE,
    };

    let mut interpreter = Interpreter::new(Rc::clone(&host), CancelToken::new());

    match interpreter.interpret_expression(&expr) {
        Ok(value) => {
            host.print(&value.to_string());

            0
        }

        Err(_) => RUNTIME_ERROR_EXIT_CODE,
    }
}

/// Execute a whole program: scan, parse, resolve, interpret.
///
/// Compile-time diagnostics from all three front-end stages accumulate
/// before the run is abandoned, so the user sees as many as possible in one
/// go. Cancellation ends the run cleanly with a success exit code.
pub fn run(source: &[u8], host: Rc<dyn Host>, cancel: CancelToken) -> i32 {
    info!("Starting run over {} byte(s) of source", source.len());

    let (tokens, scan_error) = scanner::scan(source, host.as_ref());

    // Parse even after scan errors so later diagnostics still surface.
    let (statements, parse_error) = Parser::new(tokens, host.as_ref()).parse();

    if scan_error || parse_error {
        return COMPILE_ERROR_EXIT_CODE;
    }

    let mut interpreter = Interpreter::new(Rc::clone(&host), cancel);

    let resolve_error = Resolver::new(&mut interpreter, host.as_ref()).resolve(&statements);

    if resolve_error {
        return COMPILE_ERROR_EXIT_CODE;
    }

    match interpreter.interpret(&statements) {
        Ok(outcome) => {
            info!("Run finished: {:?}", outcome);

            0
        }

        Err(_) => RUNTIME_ERROR_EXIT_CODE,
    }
}
