//! A tiny interactive command interpreter.
//!
//! This crate reads one line of input at a time, classifies it into a
//! [`parser::Directive`] (argument vector, optional single pipe stage, optional
//! output redirection, background flag) and realizes that directive as one or
//! two child processes with the appropriate descriptor wiring. Built-in
//! commands (`cd`, `exit`, `pwd`) run in-process and are recognized before any
//! directive classification takes place.
//!
//! The main entry point is [`Interpreter`], which owns the environment and the
//! set of background jobs and drives the interactive read loop. The public
//! modules [`command`] and [`env`] expose the traits and types needed to
//! implement additional built-in commands.

mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
mod lexer;
pub mod parser;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
