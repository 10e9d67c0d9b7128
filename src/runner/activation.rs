//! Program objects: resumable activations of instrumented code.
//!
//! An [`Activation`] is one live execution of a function or program body: a
//! program counter over its suspension points, its temp slots, its scope
//! container and the chain it closed over. `resume` drives it to the next
//! suspension point or to completion; once completed it never yields again.

use std::cell::RefCell;
use std::rc::Rc;

use crate::compiler::code::{
    CallKind, CallSite, Callee, FunctionCode, InstrumentedProgram, Instr, MemberKey, TempId,
};

use super::context::{self, ContextRef};
use super::ds::error::RuntimeError;
use super::ds::scope::{Scope, ScopeRef};
use super::ds::value::{Closure, ObjectRef, Value};
use super::eval::{evaluate, get_property, property_key, to_boolean, EvalEnv};
use crate::compiler::code::VarKind;

/// What `resume` produced: a pause, or the activation's completion value.
pub enum Resumption {
    Suspended(Suspension),
    Completed(Value),
}

/// Descriptor of one pause. `name` and `scope` are present only on the
/// first suspension of a body; `invocation` only at call/`new` sites;
/// `breakpoint` only for `debugger` statements.
pub struct Suspension {
    pub line: u32,
    pub name: Option<String>,
    pub scope: Option<ScopeRef>,
    pub breakpoint: bool,
    pub invocation: Option<Invocation>,
    pub step_again: bool,
}

/// Outcome of eagerly starting an invocation. Whether a callee is
/// steppable is unknowable until the call is made; the result is tagged so
/// the stepper dispatches with a match instead of shape-sniffing.
pub enum Invocation {
    /// The callee is instrumented: a not-yet-started nested activation.
    Activation(Box<Activation>),
    /// The callee was native and has already run to completion.
    Completed(Value),
}

pub struct Activation {
    code: Rc<FunctionCode>,
    /// Lexical chain, outermost first; the activation's own scope is last.
    scopes: Vec<ScopeRef>,
    context: ContextRef,
    this_value: Value,
    /// For constructor activations: the instance under construction, which
    /// becomes the completion value.
    constructed: Option<ObjectRef>,
    pc: usize,
    temps: RefCell<Vec<Value>>,
    pending_dest: Option<TempId>,
    entry_reported: bool,
    finished: bool,
}

impl Activation {
    pub fn new(
        code: Rc<FunctionCode>,
        outer_scopes: Vec<ScopeRef>,
        context: ContextRef,
        this_value: Value,
        args: Vec<Value>,
        constructed: Option<ObjectRef>,
    ) -> Activation {
        let mut scope = Scope::new();
        let mut args = args.into_iter();
        for var in &code.scope_vars {
            match var.kind {
                VarKind::Parameter => {
                    scope.declare(&var.name, args.next().unwrap_or(Value::Undefined))
                }
                VarKind::Local => scope.declare(&var.name, Value::Undefined),
            }
        }
        let temps = RefCell::new(vec![Value::Undefined; code.temp_count]);
        let mut scopes = outer_scopes;
        scopes.push(scope.into_shared());
        Activation {
            code,
            scopes,
            context,
            this_value,
            constructed,
            pc: 0,
            temps,
            pending_dest: None,
            entry_reported: false,
            finished: false,
        }
    }

    pub fn from_closure(
        closure: &Rc<Closure>,
        this_value: Value,
        args: Vec<Value>,
        context: &ContextRef,
        constructed: Option<ObjectRef>,
    ) -> Activation {
        Activation::new(
            closure.code.clone(),
            closure.env.clone(),
            context.clone(),
            this_value,
            args,
            constructed,
        )
    }

    pub fn function_name(&self) -> &str {
        &self.code.name
    }

    pub fn own_scope(&self) -> ScopeRef {
        self.scopes.last().unwrap().clone()
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Drive to the next suspension point or to completion. `sent` is the
    /// result of the invocation the previous suspension was waiting on.
    pub fn resume(&mut self, sent: Value) -> Result<Resumption, RuntimeError> {
        if self.finished {
            return Ok(Resumption::Completed(Value::Undefined));
        }
        if let Some(dest) = self.pending_dest.take() {
            self.temps.borrow_mut()[dest] = sent;
        }
        let code = self.code.clone();
        loop {
            if self.pc >= code.code.len() {
                return Ok(self.complete(Value::Undefined));
            }
            match &code.code[self.pc] {
                Instr::Pause { line, breakpoint } => {
                    self.pc += 1;
                    return Ok(Resumption::Suspended(
                        self.suspend(*line, *breakpoint, None, false),
                    ));
                }
                Instr::Eval(expr) => {
                    self.eval(expr)?;
                    self.pc += 1;
                }
                Instr::Branch { test, on_false } => {
                    let value = self.eval(test)?;
                    if to_boolean(&value) {
                        self.pc += 1;
                    } else {
                        self.pc = *on_false;
                    }
                }
                Instr::Jump { target } => self.pc = *target,
                Instr::Return { argument } => {
                    let value = match argument {
                        Some(expr) => self.eval(expr)?,
                        None => Value::Undefined,
                    };
                    return Ok(self.complete(value));
                }
                Instr::Call(site) => {
                    let invocation = self.perform_call(site)?;
                    self.pc += 1;
                    self.pending_dest = Some(site.dest);
                    return Ok(Resumption::Suspended(self.suspend(
                        site.line,
                        false,
                        Some(invocation),
                        site.step_again,
                    )));
                }
            }
        }
    }

    fn complete(&mut self, value: Value) -> Resumption {
        self.finished = true;
        let result = match &self.constructed {
            Some(obj) => Value::Object(obj.clone()),
            None => value,
        };
        Resumption::Completed(result)
    }

    fn suspend(
        &mut self,
        line: u32,
        breakpoint: bool,
        invocation: Option<Invocation>,
        step_again: bool,
    ) -> Suspension {
        let (name, scope) = if self.entry_reported {
            (None, None)
        } else {
            self.entry_reported = true;
            (Some(self.code.name.clone()), Some(self.own_scope()))
        };
        Suspension {
            line,
            name,
            scope,
            breakpoint,
            invocation,
            step_again,
        }
    }

    fn eval(&self, expr: &crate::compiler::code::CExpr) -> Result<Value, RuntimeError> {
        let env = EvalEnv {
            scopes: &self.scopes,
            context: &self.context,
            this: &self.this_value,
            temps: &self.temps,
        };
        evaluate(expr, &env)
    }

    /// Start an invocation eagerly: a native callee runs to completion here
    /// and now, an instrumented one comes back as a fresh activation.
    fn perform_call(&self, site: &CallSite) -> Result<Invocation, RuntimeError> {
        match &site.kind {
            CallKind::Invoke { callee, arguments } => {
                let (function, this) = match callee {
                    Callee::Plain(expr) => (self.eval(expr)?, Value::Undefined),
                    Callee::Member { object, property } => {
                        let object = self.eval(object)?;
                        let key = match property {
                            MemberKey::Named(name) => name.clone(),
                            MemberKey::Computed(expr) => property_key(&self.eval(expr)?),
                        };
                        let function = get_property(&object, &key)?;
                        (function, object)
                    }
                };
                let mut args = vec![];
                for a in arguments {
                    args.push(self.eval(a)?);
                }
                match function {
                    Value::Function(closure) => Ok(Invocation::Activation(Box::new(
                        Activation::from_closure(&closure, this, args, &self.context, None),
                    ))),
                    Value::Native(native) => Ok(Invocation::Completed(native.call(this, args)?)),
                    other => Err(RuntimeError::TypeError(format!(
                        "{} is not a function",
                        other
                    ))),
                }
            }
            CallKind::Instantiate {
                constructor,
                name,
                arguments,
            } => {
                let constructor = self.eval(constructor)?;
                let mut args = vec![];
                for a in arguments {
                    args.push(self.eval(a)?);
                }
                context::instantiate(&self.context, constructor, name, args)
            }
        }
    }
}

impl InstrumentedProgram {
    /// Produce a fresh program object bound to `context`. Each call yields
    /// an independent activation.
    pub fn instantiate(&self, context: &ContextRef) -> Activation {
        Activation::new(
            self.root.clone(),
            vec![],
            context.clone(),
            Value::Undefined,
            vec![],
            None,
        )
    }
}
