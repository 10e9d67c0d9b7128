//! # stepjs - an in-process stepping debugger for a JavaScript subset
//!
//! Source code is compiled into an *instrumented* form that can suspend at
//! every statement and call boundary; a stepping interpreter then drives it
//! under explicit control while exposing the live call stack and scopes.
//!
//! ## Quick start
//!
//! ```
//! use stepjs::runner::context::ExecutionContext;
//! use stepjs::runner::debugger::{Debugger, DebuggerEvents};
//! use stepjs::runner::ds::value::Value;
//!
//! let mut context = ExecutionContext::new();
//! context.set("x", Value::Number(0.0));
//!
//! let mut debugger = Debugger::new(context, DebuggerEvents::default());
//! debugger.load("x = 5;").unwrap();
//! debugger.start(false).unwrap();
//!
//! assert_eq!(
//!     debugger.context().borrow().get("x"),
//!     Some(Value::Number(5.0))
//! );
//! ```
//!
//! ## Stepping a program by hand
//!
//! ```
//! use std::cell::RefCell;
//! use std::collections::HashSet;
//! use std::rc::Rc;
//! use stepjs::compiler::{compile, CompileOptions};
//! use stepjs::runner::breakpoints::BreakpointSet;
//! use stepjs::runner::context::ExecutionContext;
//! use stepjs::runner::stepper::{Stepper, StepperCallbacks};
//!
//! let context = ExecutionContext::new().into_shared();
//! let names: HashSet<String> = context.borrow().names().into_iter().collect();
//! let program = compile("var a = 1;\nvar b = a + 1;", &names, &CompileOptions::default()).unwrap();
//!
//! let breakpoints = Rc::new(RefCell::new(BreakpointSet::new()));
//! let mut stepper = Stepper::new(
//!     program.instantiate(&context),
//!     breakpoints,
//!     StepperCallbacks::default(),
//! );
//!
//! stepper.step_over().unwrap(); // primes the stepper: paused before line 1
//! assert_eq!(stepper.line(), 1);
//! stepper.step_over().unwrap();
//! assert_eq!(stepper.line(), 2);
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`compiler`]** - instrumentation compiler: AST to suspendable
//!   state machines (scope analysis, call hoisting, display naming)
//! - **[`runner`]** - program objects, the stepping interpreter,
//!   breakpoints, the task registry and the debugger facade

#[macro_use]
extern crate lazy_static;

pub mod compiler;
pub mod parser;
pub mod runner;
