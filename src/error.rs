//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here. This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving the source position
//! every diagnostic needs.
//!
//! The module does not print diagnostics itself; the host sinks in
//! [`crate::host`] own presentation.

use std::io;

use log::info;
use thiserror::Error;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position information.
    #[error("[line {line}:{column}] {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,

        /// 1-based column where the error occurred.
        column: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}:{column}] {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// Static-analysis failure found by the resolver pass.
    #[error("[line {line}:{column}] {message}")]
    Resolve {
        message: String,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error. Printed as the message followed by the
    /// position on its own line.
    #[error("{message}\n[line {line}:{column}]")]
    Runtime {
        message: String,
        line: usize,
        column: usize,
    },

    /// Wrapper around `std::io::Error`. Enables `?` on I/O ops.
    #[error("{0}")]
    Io(String),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}:{}, msg={}", line, column, message);

        LoxError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}:{}, msg={}",
            line, column, message
        );

        LoxError::Parse {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}:{}, msg={}",
            line, column, message
        );

        LoxError::Resolve {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}:{}, msg={}",
            line, column, message
        );

        LoxError::Runtime {
            message,
            line,
            column,
        }
    }

    /// Source position carried by the error, if any.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            LoxError::Lex { line, column, .. }
            | LoxError::Parse { line, column, .. }
            | LoxError::Resolve { line, column, .. }
            | LoxError::Runtime { line, column, .. } => Some((*line, *column)),

            LoxError::Io(_) => None,
        }
    }

    /// The bare message, without position decoration.
    pub fn message(&self) -> &str {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message,

            LoxError::Io(message) => message,
        }
    }
}

impl From<io::Error> for LoxError {
    fn from(err: io::Error) -> Self {
        LoxError::Io(err.to_string())
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
