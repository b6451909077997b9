//! Host-provided sinks for program output, user input and diagnostics,
//! plus the cancellation token threaded through `run`.
//!
//! The interpreter never talks to stdout/stderr directly; everything flows
//! through a [`Host`] so that embeddings (tests, a web terminal) can capture
//! or redirect the streams. [`StdioHost`] is the CLI implementation,
//! [`BufferHost`] the in-memory one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::error::Result;

/// Sinks the language pipeline reports through.
///
/// Diagnostic sinks receive raw positions and messages; presentation (the
/// `[line L:C]` prefix and stream choice) belongs to the implementation.
pub trait Host {
    /// Emit one line of program output.
    fn print(&self, text: &str);

    /// Read a line of user input after showing `prompt`.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Lexical error during scanning.
    fn scan_error(&self, line: usize, column: usize, message: &str);

    /// Syntactic or static-analysis error (parser and resolver share this
    /// channel, as both block execution the same way).
    fn parse_error(&self, line: usize, column: usize, message: &str);

    /// Error raised while interpreting.
    fn runtime_error(&self, line: usize, column: usize, message: &str);
}

/// One-shot cancellation signal, pollable from inside `run`.
///
/// Clones share the underlying flag, so the CLI can hand one clone to a
/// signal handler and another to the interpreter.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the signal. Idempotent.
    pub fn cancel(&self) {
        debug!("Cancellation signal tripped");

        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Host wired to the process streams: program output and prompts to stdout,
/// diagnostics to stderr.
#[derive(Debug, Default)]
pub struct StdioHost;

impl Host for StdioHost {
    fn print(&self, text: &str) {
        println!("{}", text);
    }

    fn input(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line: String = String::new();
        io::stdin().lock().read_line(&mut line)?;

        // Strip the trailing newline, and the \r on CRLF platforms.
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }

        Ok(line)
    }

    fn scan_error(&self, line: usize, column: usize, message: &str) {
        eprintln!("[line {}:{}] {}", line, column, message);
    }

    fn parse_error(&self, line: usize, column: usize, message: &str) {
        eprintln!("[line {}:{}] {}", line, column, message);
    }

    fn runtime_error(&self, line: usize, column: usize, message: &str) {
        eprintln!("{}", message);
        eprintln!("[line {}:{}]", line, column);
    }
}

/// Host that records everything in memory. Used by the integration tests
/// and by embeddings that render output themselves.
#[derive(Debug, Default)]
pub struct BufferHost {
    output: RefCell<Vec<String>>,
    diagnostics: RefCell<Vec<String>>,
    input_queue: RefCell<VecDeque<String>>,
}

impl BufferHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load lines for the `input` native to consume.
    pub fn queue_input<S: Into<String>>(&self, line: S) {
        self.input_queue.borrow_mut().push_back(line.into());
    }

    /// Program output lines, in emission order.
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    /// Diagnostic lines from all three error sinks, in emission order.
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.borrow().clone()
    }
}

impl Host for BufferHost {
    fn print(&self, text: &str) {
        self.output.borrow_mut().push(text.to_string());
    }

    fn input(&self, _prompt: &str) -> Result<String> {
        Ok(self.input_queue.borrow_mut().pop_front().unwrap_or_default())
    }

    fn scan_error(&self, line: usize, column: usize, message: &str) {
        self.diagnostics
            .borrow_mut()
            .push(format!("[line {}:{}] {}", line, column, message));
    }

    fn parse_error(&self, line: usize, column: usize, message: &str) {
        self.diagnostics
            .borrow_mut()
            .push(format!("[line {}:{}] {}", line, column, message));
    }

    fn runtime_error(&self, line: usize, column: usize, message: &str) {
        self.diagnostics
            .borrow_mut()
            .push(format!("{} [line {}:{}]", message, line, column));
    }
}
