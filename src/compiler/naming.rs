//! Display-name resolution for function bodies.
//!
//! Pure static analysis over the source AST: a function picks up the dotted
//! path of whatever it is being bound to (declarator id, assignment target,
//! object-literal property chain), with a fixed marker for anything that
//! cannot be named.

use crate::parser::ast::{ExpressionType, HasMeta, MemberProperty};

use super::CompileError;

/// Marker for functions that cannot be named statically.
pub const ANONYMOUS: &str = "<anonymous>";
/// Display name of the program root.
pub const PROGRAM: &str = "<PROGRAM>";

/// Dotted path of a reference expression (`a`, `a.b.c`, `this.x`), used for
/// assignment-target naming and `new` constructor display names.
pub fn stringify_reference(expr: &ExpressionType) -> Result<String, CompileError> {
    match expr {
        ExpressionType::Identifier(id) => Ok(id.name.clone()),
        ExpressionType::ThisExpression { .. } => Ok("this".to_string()),
        ExpressionType::MemberExpression {
            object, property, ..
        } => match property {
            MemberProperty::Identifier(name) => {
                Ok(format!("{}.{}", stringify_reference(object)?, name))
            }
            MemberProperty::Computed(_) => Err(unstringifiable(expr, "computed member expression")),
        },
        _ => Err(unstringifiable(expr, "expression")),
    }
}

fn unstringifiable(expr: &ExpressionType, what: &str) -> CompileError {
    CompileError::UnsupportedConstruct {
        what: format!("cannot derive a name from this {}", what),
        line: expr.get_meta().start_line,
    }
}
