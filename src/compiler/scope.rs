//! Static scope analysis.
//!
//! Computes the set of names a function/program body declares: `var`
//! declarators and function-declaration ids anywhere in the body (including
//! nested blocks and `for` headers, but not nested function bodies), plus
//! the body's parameters. At the program root, names already supplied by
//! the execution context are excluded so that root-level user variables
//! with those names keep referring to the context.

use std::collections::HashSet;

use crate::parser::ast::{ForInit, IdentifierData, StatementType};

use super::code::{ScopeVar, VarKind};

pub fn analyze_body(
    params: &[IdentifierData],
    body: &[StatementType],
    excluded: Option<&HashSet<String>>,
) -> Vec<ScopeVar> {
    let mut vars: Vec<ScopeVar> = vec![];
    let mut seen: HashSet<String> = HashSet::new();

    for param in params {
        if seen.insert(param.name.clone()) {
            vars.push(ScopeVar {
                name: param.name.clone(),
                kind: VarKind::Parameter,
            });
        }
    }

    let mut declared = vec![];
    for stmt in body {
        collect_declarations(stmt, &mut declared);
    }
    for name in declared {
        if let Some(excluded) = excluded {
            if excluded.contains(&name) {
                continue;
            }
        }
        if seen.insert(name.clone()) {
            vars.push(ScopeVar {
                name,
                kind: VarKind::Local,
            });
        }
    }
    vars
}

fn collect_declarations(stmt: &StatementType, out: &mut Vec<String>) {
    match stmt {
        StatementType::VariableDeclaration(decl) => {
            for d in &decl.declarations {
                out.push(d.id.name.clone());
            }
        }
        // the declaration's name lives in the enclosing scope; its body
        // declares a scope of its own
        StatementType::FunctionDeclaration(f) => {
            if let Some(id) = &f.id {
                out.push(id.name.clone());
            }
        }
        StatementType::BlockStatement(block) => {
            for s in &block.body {
                collect_declarations(s, out);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_declarations(consequent, out);
            if let Some(alt) = alternate {
                collect_declarations(alt, out);
            }
        }
        StatementType::WhileStatement { body, .. } => collect_declarations(body, out),
        StatementType::ForStatement { init, body, .. } => {
            if let Some(ForInit::VariableDeclaration(decl)) = init {
                for d in &decl.declarations {
                    out.push(d.id.name.clone());
                }
            }
            collect_declarations(body, out);
        }
        _ => {}
    }
}
