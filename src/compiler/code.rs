//! The instrumented-program model.
//!
//! The compiler lowers every function/program body into a flat instruction
//! list over *call-free* expressions. Statement boundaries, `debugger`
//! statements and call/`new` sites become explicit suspension points; nested
//! calls are hoisted into temp slots beforehand so that an activation can be
//! resumed at any suspension with a plain method call.

use std::fmt;
use std::fmt::Write;
use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, LiteralType, LogicalOperator, UnaryOperator,
    UpdateOperator,
};

use super::Language;

/// Index of a temporary slot within one activation.
pub type TempId = usize;

/// A compiled program: the root body plus every nested function body
/// embedded in its instructions. Re-invocable; each
/// `instantiate(context)` call produces an independent program object.
#[derive(Debug)]
pub struct InstrumentedProgram {
    pub root: Rc<FunctionCode>,
    pub language: Language,
}

impl InstrumentedProgram {
    /// Human-readable listing of the generated instructions, used by the
    /// `dump_instrumented` compile option.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        write_function(&mut out, &self.root, 0);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    Parameter,
    Local,
}

/// One statically declared name of a body's scope container.
#[derive(Debug, Clone)]
pub struct ScopeVar {
    pub name: String,
    pub kind: VarKind,
}

/// One compiled function or program body.
#[derive(Debug)]
pub struct FunctionCode {
    /// Display name resolved by the static naming rules.
    pub name: String,
    pub params: Vec<String>,
    pub scope_vars: Vec<ScopeVar>,
    /// Lexical depth: the index of this body's scope container in the
    /// runtime scope chain. The program root is 0.
    pub depth: usize,
    /// Line of the body's closing brace; the suspension line for empty
    /// bodies.
    pub end_line: u32,
    pub code: Vec<Instr>,
    pub temp_count: usize,
}

#[derive(Debug)]
pub enum Instr {
    /// Statement-boundary suspension, or a `debugger` breakpoint when the
    /// flag is set. The first suspension of a body additionally reports the
    /// body's name and scope container.
    Pause { line: u32, breakpoint: bool },
    /// Evaluate a call-free expression for its effect.
    Eval(CExpr),
    /// Call/`new` suspension; the result of the invocation is written to
    /// `dest` when the activation is resumed.
    Call(CallSite),
    /// Jump to `on_false` when the test is falsy, fall through otherwise.
    Branch { test: CExpr, on_false: usize },
    Jump { target: usize },
    Return { argument: Option<CExpr> },
}

#[derive(Debug)]
pub struct CallSite {
    pub dest: TempId,
    pub line: u32,
    /// True for statement-level calls: one further internal advance is
    /// needed after the invocation completes before the caller's next
    /// visible statement boundary is reached.
    pub step_again: bool,
    pub kind: CallKind,
}

#[derive(Debug)]
pub enum CallKind {
    Invoke {
        callee: Callee,
        arguments: Vec<CExpr>,
    },
    /// A rewritten `new` expression, routed through the execution context's
    /// instantiate hook together with the constructor's display name.
    Instantiate {
        constructor: CExpr,
        name: String,
        arguments: Vec<CExpr>,
    },
}

/// Callee of a plain call; member callees keep their object so the
/// interpreter can bind `this`.
#[derive(Debug)]
pub enum Callee {
    Plain(CExpr),
    Member { object: CExpr, property: MemberKey },
}

#[derive(Debug)]
pub enum MemberKey {
    Named(String),
    Computed(Box<CExpr>),
}

/// A call-free compiled expression. Local-variable references have been
/// redirected onto scope containers addressed by lexical depth; hoisted
/// call results are read back from temp slots.
#[derive(Debug)]
pub enum CExpr {
    Literal(LiteralType),
    ScopeRef { depth: usize, name: String },
    ContextRef(String),
    This,
    Temp(TempId),
    Array(Vec<CExpr>),
    Object(Vec<(String, CExpr)>),
    Function(Rc<FunctionCode>),
    Unary {
        operator: UnaryOperator,
        argument: Box<CExpr>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<CExpr>,
        right: Box<CExpr>,
    },
    Logical {
        operator: LogicalOperator,
        left: Box<CExpr>,
        right: Box<CExpr>,
    },
    Conditional {
        test: Box<CExpr>,
        consequent: Box<CExpr>,
        alternate: Box<CExpr>,
    },
    Assignment {
        target: Target,
        operator: AssignmentOperator,
        value: Box<CExpr>,
    },
    Update {
        target: Target,
        operator: UpdateOperator,
        prefix: bool,
    },
    Member {
        object: Box<CExpr>,
        property: MemberKey,
    },
    Sequence(Vec<CExpr>),
}

/// Assignment target.
#[derive(Debug)]
pub enum Target {
    Scope { depth: usize, name: String },
    Context(String),
    Temp(TempId),
    Member { object: Box<CExpr>, property: MemberKey },
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

fn write_function(out: &mut String, func: &FunctionCode, indent: usize) {
    let pad = "  ".repeat(indent);
    let _ = writeln!(
        out,
        "{}function {}({}) depth={} temps={} {{",
        pad,
        func.name,
        func.params.join(", "),
        func.depth,
        func.temp_count
    );
    let mut nested: Vec<Rc<FunctionCode>> = vec![];
    for (i, instr) in func.code.iter().enumerate() {
        let _ = writeln!(out, "{}  {:>3}: {}", pad, i, instr);
        collect_nested(instr, &mut nested);
    }
    let _ = writeln!(out, "{}}}", pad);
    for f in nested {
        write_function(out, &f, indent + 1);
    }
}

fn collect_nested(instr: &Instr, out: &mut Vec<Rc<FunctionCode>>) {
    match instr {
        Instr::Eval(e) | Instr::Branch { test: e, .. } => collect_nested_expr(e, out),
        Instr::Return { argument: Some(e) } => collect_nested_expr(e, out),
        Instr::Call(site) => match &site.kind {
            CallKind::Invoke { callee, arguments } => {
                match callee {
                    Callee::Plain(e) => collect_nested_expr(e, out),
                    Callee::Member { object, property } => {
                        collect_nested_expr(object, out);
                        if let MemberKey::Computed(e) = property {
                            collect_nested_expr(e, out);
                        }
                    }
                }
                for a in arguments {
                    collect_nested_expr(a, out);
                }
            }
            CallKind::Instantiate {
                constructor,
                arguments,
                ..
            } => {
                collect_nested_expr(constructor, out);
                for a in arguments {
                    collect_nested_expr(a, out);
                }
            }
        },
        _ => {}
    }
}

fn collect_nested_expr(expr: &CExpr, out: &mut Vec<Rc<FunctionCode>>) {
    match expr {
        CExpr::Function(f) => out.push(f.clone()),
        CExpr::Array(items) | CExpr::Sequence(items) => {
            for e in items {
                collect_nested_expr(e, out);
            }
        }
        CExpr::Object(props) => {
            for (_, e) in props {
                collect_nested_expr(e, out);
            }
        }
        CExpr::Unary { argument, .. } => collect_nested_expr(argument, out),
        CExpr::Binary { left, right, .. } | CExpr::Logical { left, right, .. } => {
            collect_nested_expr(left, out);
            collect_nested_expr(right, out);
        }
        CExpr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect_nested_expr(test, out);
            collect_nested_expr(consequent, out);
            collect_nested_expr(alternate, out);
        }
        CExpr::Assignment { target, value, .. } => {
            collect_nested_target(target, out);
            collect_nested_expr(value, out);
        }
        CExpr::Update { target, .. } => collect_nested_target(target, out),
        CExpr::Member { object, property } => {
            collect_nested_expr(object, out);
            if let MemberKey::Computed(e) = property {
                collect_nested_expr(e, out);
            }
        }
        _ => {}
    }
}

fn collect_nested_target(target: &Target, out: &mut Vec<Rc<FunctionCode>>) {
    if let Target::Member { object, property } = target {
        collect_nested_expr(object, out);
        if let MemberKey::Computed(e) = property {
            collect_nested_expr(e, out);
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Pause { line, breakpoint } => {
                if *breakpoint {
                    write!(f, "pause line {} (breakpoint)", line)
                } else {
                    write!(f, "pause line {}", line)
                }
            }
            Instr::Eval(e) => write!(f, "eval {}", e),
            Instr::Call(site) => {
                write!(f, "%{} = ", site.dest)?;
                match &site.kind {
                    CallKind::Invoke { callee, arguments } => {
                        match callee {
                            Callee::Plain(e) => write!(f, "call {}", e)?,
                            Callee::Member { object, property } => {
                                write!(f, "call {}{}", object, property)?
                            }
                        }
                        write!(f, "({})", join_exprs(arguments))?;
                    }
                    CallKind::Instantiate {
                        constructor,
                        name,
                        arguments,
                    } => {
                        write!(
                            f,
                            "instantiate {} \"{}\"({})",
                            constructor,
                            name,
                            join_exprs(arguments)
                        )?;
                    }
                }
                write!(f, " line {}", site.line)?;
                if site.step_again {
                    write!(f, " step-again")?;
                }
                Ok(())
            }
            Instr::Branch { test, on_false } => write!(f, "branch {} else -> {}", test, on_false),
            Instr::Jump { target } => write!(f, "jump -> {}", target),
            Instr::Return { argument: None } => write!(f, "return"),
            Instr::Return {
                argument: Some(e), ..
            } => write!(f, "return {}", e),
        }
    }
}

fn join_exprs(exprs: &[CExpr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKey::Named(name) => write!(f, ".{}", name),
            MemberKey::Computed(e) => write!(f, "[{}]", e),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Scope { depth, name } => write!(f, "$scope{}.{}", depth, name),
            Target::Context(name) => write!(f, "$context.{}", name),
            Target::Temp(id) => write!(f, "%{}", id),
            Target::Member { object, property } => write!(f, "{}{}", object, property),
        }
    }
}

impl fmt::Display for CExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CExpr::Literal(LiteralType::NumberLiteral(n)) => write!(f, "{}", n),
            CExpr::Literal(LiteralType::StringLiteral(s)) => write!(f, "{:?}", s),
            CExpr::Literal(LiteralType::BooleanLiteral(b)) => write!(f, "{}", b),
            CExpr::Literal(LiteralType::NullLiteral) => write!(f, "null"),
            CExpr::Literal(LiteralType::UndefinedLiteral) => write!(f, "undefined"),
            CExpr::ScopeRef { depth, name } => write!(f, "$scope{}.{}", depth, name),
            CExpr::ContextRef(name) => write!(f, "$context.{}", name),
            CExpr::This => write!(f, "this"),
            CExpr::Temp(id) => write!(f, "%{}", id),
            CExpr::Array(items) => write!(f, "[{}]", join_exprs(items)),
            CExpr::Object(props) => {
                let body = props
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", body)
            }
            CExpr::Function(code) => write!(f, "<function {}>", code.name),
            CExpr::Unary { operator, argument } => write!(f, "({:?} {})", operator, argument),
            CExpr::Binary {
                operator,
                left,
                right,
            } => write!(f, "({} {:?} {})", left, operator, right),
            CExpr::Logical {
                operator,
                left,
                right,
            } => write!(f, "({} {:?} {})", left, operator, right),
            CExpr::Conditional {
                test,
                consequent,
                alternate,
            } => write!(f, "({} ? {} : {})", test, consequent, alternate),
            CExpr::Assignment {
                target,
                operator,
                value,
            } => write!(f, "({} {:?} {})", target, operator, value),
            CExpr::Update {
                target,
                operator,
                prefix,
            } => {
                if *prefix {
                    write!(f, "({:?} {})", operator, target)
                } else {
                    write!(f, "({} {:?})", target, operator)
                }
            }
            CExpr::Member { object, property } => write!(f, "{}{}", object, property),
            CExpr::Sequence(items) => write!(f, "({})", join_exprs(items)),
        }
    }
}
