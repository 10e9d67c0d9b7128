//! The instrumentation compiler.
//!
//! Parses source text, computes static scope information, and lowers every
//! function/program body into the suspendable instruction form of
//! [`code::InstrumentedProgram`].

pub mod code;
mod lower;
mod naming;
pub mod scope;
#[cfg(test)]
mod unit_tests;

use std::collections::HashSet;

use log::debug;
use pest::error::LineColLocation;
use thiserror::Error;

use crate::parser::{parse_to_ast, Rule};

pub use naming::{ANONYMOUS, PROGRAM};

/// The source dialect being instrumented. The original system needed two
/// strategies (native resumable functions vs. a transform-based polyfill);
/// they are behaviorally equivalent by contract, and here both select the
/// same state-machine lowering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Language {
    Es5,
    Es6,
}

impl Default for Language {
    fn default() -> Self {
        Language::Es5
    }
}

#[derive(Debug, Default)]
pub struct CompileOptions {
    pub language: Language,
    /// Log the generated instruction listing, for debugging the compiler.
    pub dump_instrumented: bool,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(Box<pest::error::Error<Rule>>),
    #[error("unsupported construct at line {line}: {what}")]
    UnsupportedConstruct { what: String, line: u32 },
}

impl CompileError {
    /// 1-based line/column of a parse error.
    pub fn line_col(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Parse(e) => Some(match e.line_col {
                LineColLocation::Pos(pos) => pos,
                LineColLocation::Span(start, _) => start,
            }),
            CompileError::UnsupportedConstruct { .. } => None,
        }
    }

    /// 1-based line the error refers to, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Parse(_) => self.line_col().map(|(line, _)| line),
            CompileError::UnsupportedConstruct { line, .. } => Some(*line as usize),
        }
    }
}

/// Compile source text into an instrumented program.
///
/// `context_names` are the names supplied by the execution context the
/// program will run against; root-level variables that redeclare one of
/// them keep resolving to the context.
pub fn compile(
    source: &str,
    context_names: &HashSet<String>,
    options: &CompileOptions,
) -> Result<code::InstrumentedProgram, CompileError> {
    let ast = parse_to_ast(source).map_err(|e| CompileError::Parse(Box::new(e)))?;
    let program = lower::lower_program(&ast, context_names, options.language)?;
    debug!(
        "compiled {} top-level statement(s) into {} instruction(s)",
        ast.body.len(),
        program.root.code.len()
    );
    if options.dump_instrumented {
        debug!("instrumented program:\n{}", program.listing());
    }
    Ok(program)
}
