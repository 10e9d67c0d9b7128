//! Lowering of function/program bodies into instrumented instruction lists.
//!
//! Each body becomes a flat `Vec<Instr>`: a `Pause` before every top-level
//! statement, calls hoisted into temp slots in evaluation order, local
//! references redirected onto scope containers, and structured control flow
//! expressed with `Branch`/`Jump`. Subexpressions that would otherwise be
//! reordered around a hoisted call are spilled to temps first, and the
//! short-circuit operators lower to explicit branches when their lazy
//! operand contains a call.

use std::collections::HashSet;
use std::rc::Rc;

use crate::parser::ast::*;

use super::code::*;
use super::naming::{stringify_reference, ANONYMOUS, PROGRAM};
use super::{scope, CompileError, Language};

pub fn lower_program(
    program: &ProgramData,
    context_names: &HashSet<String>,
    language: Language,
) -> Result<InstrumentedProgram, CompileError> {
    let mut lowerer = Lowerer {
        scopes: vec![],
        context_names,
    };
    let vars = scope::analyze_body(&[], &program.body, Some(context_names));
    let root = lowerer.lower_body(
        PROGRAM.to_string(),
        &[],
        vars,
        &program.body,
        program.meta.end_line,
    )?;
    Ok(InstrumentedProgram {
        root: Rc::new(root),
        language,
    })
}

struct Lowerer<'a> {
    /// Names declared by each enclosing body, outermost first; the index is
    /// the lexical depth used by scope references.
    scopes: Vec<HashSet<String>>,
    context_names: &'a HashSet<String>,
}

struct BodyBuilder {
    code: Vec<Instr>,
    temp_count: usize,
}

impl BodyBuilder {
    fn new() -> Self {
        BodyBuilder {
            code: vec![],
            temp_count: 0,
        }
    }

    fn emit(&mut self, instr: Instr) -> usize {
        self.code.push(instr);
        self.code.len() - 1
    }

    fn here(&self) -> usize {
        self.code.len()
    }

    fn alloc_temp(&mut self) -> TempId {
        self.temp_count += 1;
        self.temp_count - 1
    }

    fn patch(&mut self, at: usize, to: usize) {
        match &mut self.code[at] {
            Instr::Branch { on_false, .. } => *on_false = to,
            Instr::Jump { target } => *target = to,
            _ => unreachable!("patched instruction is not a branch"),
        }
    }
}

impl<'a> Lowerer<'a> {
    fn lower_body(
        &mut self,
        name: String,
        params: &[IdentifierData],
        scope_vars: Vec<ScopeVar>,
        body: &[StatementType],
        end_line: u32,
    ) -> Result<FunctionCode, CompileError> {
        let depth = self.scopes.len();
        self.scopes
            .push(scope_vars.iter().map(|v| v.name.clone()).collect());

        let mut b = BodyBuilder::new();
        let result = if body.is_empty() {
            // stepping into an empty body is still observable
            b.emit(Instr::Pause {
                line: end_line,
                breakpoint: false,
            });
            Ok(())
        } else {
            self.lower_statements(&mut b, body)
        };
        self.scopes.pop();
        result?;

        Ok(FunctionCode {
            name,
            params: params.iter().map(|p| p.name.clone()).collect(),
            scope_vars,
            depth,
            end_line,
            code: b.code,
            temp_count: b.temp_count,
        })
    }

    fn lower_function(
        &mut self,
        f: &FunctionData,
        name: String,
    ) -> Result<FunctionCode, CompileError> {
        let vars = scope::analyze_body(&f.params, &f.body.body, None);
        self.lower_body(name, &f.params, vars, &f.body.body, f.body.meta.end_line)
    }

    fn lower_statements(
        &mut self,
        b: &mut BodyBuilder,
        stmts: &[StatementType],
    ) -> Result<(), CompileError> {
        for stmt in stmts {
            self.lower_statement(b, stmt, true)?;
        }
        Ok(())
    }

    /// Lower one statement; `pause` is false for non-block statements nested
    /// directly under `if`/`while`/`for`, which get no boundary of their own.
    fn lower_statement(
        &mut self,
        b: &mut BodyBuilder,
        stmt: &StatementType,
        pause: bool,
    ) -> Result<(), CompileError> {
        match stmt {
            StatementType::DebuggerStatement { meta } => {
                b.emit(Instr::Pause {
                    line: meta.start_line,
                    breakpoint: true,
                });
            }
            StatementType::EmptyStatement { meta } => {
                if pause {
                    b.emit(Instr::Pause {
                        line: meta.start_line,
                        breakpoint: false,
                    });
                }
            }
            StatementType::ExpressionStatement { meta, expression } => {
                if pause {
                    b.emit(Instr::Pause {
                        line: meta.start_line,
                        breakpoint: false,
                    });
                }
                let value = self.flatten(b, expression, true, None)?;
                if !matches!(value, CExpr::Temp(_)) {
                    b.emit(Instr::Eval(value));
                }
            }
            StatementType::VariableDeclaration(decl) => {
                self.lower_variable_declaration(b, decl, pause)?;
            }
            StatementType::FunctionDeclaration(f) => {
                if pause {
                    b.emit(Instr::Pause {
                        line: f.meta.start_line,
                        breakpoint: false,
                    });
                }
                let id = match &f.id {
                    Some(id) => id.name.clone(),
                    None => {
                        return Err(CompileError::UnsupportedConstruct {
                            what: "function declaration without a name".to_string(),
                            line: f.meta.start_line,
                        })
                    }
                };
                let code = self.lower_function(f, id.clone())?;
                let target = self.resolve_target(&id);
                b.emit(Instr::Eval(CExpr::Assignment {
                    target,
                    operator: AssignmentOperator::Equals,
                    value: Box::new(CExpr::Function(Rc::new(code))),
                }));
            }
            StatementType::ReturnStatement { meta, argument } => {
                if pause {
                    b.emit(Instr::Pause {
                        line: meta.start_line,
                        breakpoint: false,
                    });
                }
                let argument = match argument {
                    Some(e) => Some(self.flatten(b, e, false, None)?),
                    None => None,
                };
                b.emit(Instr::Return { argument });
            }
            StatementType::BlockStatement(block) => {
                if pause {
                    b.emit(Instr::Pause {
                        line: block.meta.start_line,
                        breakpoint: false,
                    });
                }
                self.lower_block_contents(b, block)?;
            }
            StatementType::IfStatement {
                meta,
                test,
                consequent,
                alternate,
            } => {
                if pause {
                    b.emit(Instr::Pause {
                        line: meta.start_line,
                        breakpoint: false,
                    });
                }
                let test = self.flatten(b, test, false, None)?;
                let branch_at = b.emit(Instr::Branch { test, on_false: 0 });
                self.lower_nested(b, consequent)?;
                match alternate {
                    Some(alt) => {
                        let jump_at = b.emit(Instr::Jump { target: 0 });
                        let else_at = b.here();
                        b.patch(branch_at, else_at);
                        self.lower_nested(b, alt)?;
                        let end = b.here();
                        b.patch(jump_at, end);
                    }
                    None => {
                        let end = b.here();
                        b.patch(branch_at, end);
                    }
                }
            }
            StatementType::WhileStatement { meta, test, body } => {
                if pause {
                    b.emit(Instr::Pause {
                        line: meta.start_line,
                        breakpoint: false,
                    });
                }
                let loop_start = b.here();
                let test = self.flatten(b, test, false, None)?;
                let branch_at = b.emit(Instr::Branch { test, on_false: 0 });
                self.lower_nested(b, body)?;
                b.emit(Instr::Jump { target: loop_start });
                let end = b.here();
                b.patch(branch_at, end);
            }
            StatementType::ForStatement {
                meta,
                init,
                test,
                update,
                body,
            } => {
                if pause {
                    b.emit(Instr::Pause {
                        line: meta.start_line,
                        breakpoint: false,
                    });
                }
                match init {
                    Some(ForInit::VariableDeclaration(decl)) => {
                        // a `for` header cannot hold statements, so the
                        // declarator assignments combine into one sequence
                        let mut parts = vec![];
                        for d in &decl.declarations {
                            if let Some(init) = &d.init {
                                let hint = declarator_hint(d, init);
                                let value = self.flatten(b, init, false, hint.as_deref())?;
                                parts.push(CExpr::Assignment {
                                    target: self.resolve_target(&d.id.name),
                                    operator: AssignmentOperator::Equals,
                                    value: Box::new(value),
                                });
                            }
                        }
                        if parts.len() == 1 {
                            b.emit(Instr::Eval(parts.pop().unwrap()));
                        } else if !parts.is_empty() {
                            b.emit(Instr::Eval(CExpr::Sequence(parts)));
                        }
                    }
                    Some(ForInit::Expression(e)) => {
                        let value = self.flatten(b, e, false, None)?;
                        if !matches!(value, CExpr::Temp(_)) {
                            b.emit(Instr::Eval(value));
                        }
                    }
                    None => {}
                }
                let loop_start = b.here();
                let branch_at = match test {
                    Some(test) => {
                        let test = self.flatten(b, test, false, None)?;
                        Some(b.emit(Instr::Branch { test, on_false: 0 }))
                    }
                    None => None,
                };
                self.lower_nested(b, body)?;
                if let Some(update) = update {
                    let value = self.flatten(b, update, false, None)?;
                    if !matches!(value, CExpr::Temp(_)) {
                        b.emit(Instr::Eval(value));
                    }
                }
                b.emit(Instr::Jump { target: loop_start });
                let end = b.here();
                if let Some(branch_at) = branch_at {
                    b.patch(branch_at, end);
                }
            }
        }
        Ok(())
    }

    /// Lower the body of an `if`/`while`/`for`: a block keeps its
    /// per-statement boundaries, a bare statement gets none.
    fn lower_nested(
        &mut self,
        b: &mut BodyBuilder,
        stmt: &StatementType,
    ) -> Result<(), CompileError> {
        if let StatementType::BlockStatement(block) = stmt {
            self.lower_block_contents(b, block)
        } else {
            self.lower_statement(b, stmt, false)
        }
    }

    fn lower_block_contents(
        &mut self,
        b: &mut BodyBuilder,
        block: &BlockStatementData,
    ) -> Result<(), CompileError> {
        if block.body.is_empty() {
            b.emit(Instr::Pause {
                line: block.meta.end_line,
                breakpoint: false,
            });
            Ok(())
        } else {
            self.lower_statements(b, &block.body)
        }
    }

    fn lower_variable_declaration(
        &mut self,
        b: &mut BodyBuilder,
        decl: &VariableDeclarationData,
        pause: bool,
    ) -> Result<(), CompileError> {
        if decl.declarations.iter().all(|d| d.init.is_none()) {
            // declarations-only statement: the names exist in the scope
            // container already, so there is nothing to execute
            if pause {
                b.emit(Instr::Pause {
                    line: decl.meta.start_line,
                    breakpoint: false,
                });
            }
            return Ok(());
        }
        for d in &decl.declarations {
            if let Some(init) = &d.init {
                if pause {
                    b.emit(Instr::Pause {
                        line: d.meta.start_line,
                        breakpoint: false,
                    });
                }
                let hint = declarator_hint(d, init);
                let value = self.flatten(b, init, true, hint.as_deref())?;
                b.emit(Instr::Eval(CExpr::Assignment {
                    target: self.resolve_target(&d.id.name),
                    operator: AssignmentOperator::Equals,
                    value: Box::new(value),
                }));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Name resolution
    // -----------------------------------------------------------------------

    fn resolve_reference(&self, name: &str) -> CExpr {
        for (depth, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains(name) {
                return CExpr::ScopeRef {
                    depth,
                    name: name.to_string(),
                };
            }
        }
        // context members and unresolved names both live on the context
        CExpr::ContextRef(name.to_string())
    }

    fn resolve_target(&self, name: &str) -> Target {
        for (depth, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains(name) {
                return Target::Scope {
                    depth,
                    name: name.to_string(),
                };
            }
        }
        Target::Context(name.to_string())
    }

    // -----------------------------------------------------------------------
    // Expression flattening
    // -----------------------------------------------------------------------

    /// Compile an expression, hoisting every call it contains into a `Call`
    /// instruction in evaluation order. `statement_level` is true only for
    /// the expression of an expression statement and the initializer of a
    /// non-`for` declarator; a call in that position gets `step_again`.
    fn flatten(
        &mut self,
        b: &mut BodyBuilder,
        expr: &ExpressionType,
        statement_level: bool,
        hint: Option<&str>,
    ) -> Result<CExpr, CompileError> {
        if !contains_call(expr) {
            return self.compile_pure(expr, hint);
        }
        match expr {
            ExpressionType::CallExpression {
                meta,
                callee,
                arguments,
            } => self.flatten_call(b, meta, callee, arguments, statement_level),
            ExpressionType::NewExpression {
                meta,
                callee,
                arguments,
            } => self.flatten_new(b, meta, callee, arguments, statement_level),
            ExpressionType::ArrayExpression { elements, .. } => {
                let mut out = vec![];
                for (i, e) in elements.iter().enumerate() {
                    let later = elements[i + 1..].iter().any(contains_call);
                    out.push(self.flatten_operand(b, e, later, None)?);
                }
                Ok(CExpr::Array(out))
            }
            ExpressionType::ObjectExpression { properties, .. } => {
                let base = hint.unwrap_or(ANONYMOUS);
                let mut out = vec![];
                for (i, p) in properties.iter().enumerate() {
                    let later = properties[i + 1..].iter().any(|q| contains_call(&q.value));
                    let child_hint = format!("{}.{}", base, p.key);
                    let value = self.flatten_operand(b, &p.value, later, Some(&child_hint))?;
                    out.push((p.key.clone(), value));
                }
                Ok(CExpr::Object(out))
            }
            ExpressionType::UnaryExpression {
                operator, argument, ..
            } => Ok(CExpr::Unary {
                operator: *operator,
                argument: Box::new(self.flatten(b, argument, false, None)?),
            }),
            ExpressionType::UpdateExpression {
                operator,
                argument,
                prefix,
                ..
            } => Ok(CExpr::Update {
                target: self.lower_target(b, argument, false)?,
                operator: *operator,
                prefix: *prefix,
            }),
            ExpressionType::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => {
                let left = self.flatten_operand(b, left, contains_call(right), None)?;
                let right = self.flatten(b, right, false, None)?;
                Ok(CExpr::Binary {
                    operator: *operator,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            ExpressionType::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => {
                if !contains_call(right) {
                    let left = self.flatten(b, left, false, None)?;
                    let right = self.compile_pure(right, None)?;
                    return Ok(CExpr::Logical {
                        operator: *operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                // the lazy operand holds a call: lower to a branch so the
                // hoisted call only runs when the operand is reached
                let left = self.flatten(b, left, false, None)?;
                let result = b.alloc_temp();
                b.emit(Instr::Eval(CExpr::Assignment {
                    target: Target::Temp(result),
                    operator: AssignmentOperator::Equals,
                    value: Box::new(left),
                }));
                let test = match operator {
                    LogicalOperator::And => CExpr::Temp(result),
                    LogicalOperator::Or => CExpr::Unary {
                        operator: UnaryOperator::LogicalNot,
                        argument: Box::new(CExpr::Temp(result)),
                    },
                };
                let branch_at = b.emit(Instr::Branch { test, on_false: 0 });
                let right = self.flatten(b, right, false, None)?;
                b.emit(Instr::Eval(CExpr::Assignment {
                    target: Target::Temp(result),
                    operator: AssignmentOperator::Equals,
                    value: Box::new(right),
                }));
                let end = b.here();
                b.patch(branch_at, end);
                Ok(CExpr::Temp(result))
            }
            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                if !contains_call(consequent) && !contains_call(alternate) {
                    let test = self.flatten(b, test, false, None)?;
                    return Ok(CExpr::Conditional {
                        test: Box::new(test),
                        consequent: Box::new(self.compile_pure(consequent, None)?),
                        alternate: Box::new(self.compile_pure(alternate, None)?),
                    });
                }
                let test = self.flatten(b, test, false, None)?;
                let result = b.alloc_temp();
                let branch_at = b.emit(Instr::Branch { test, on_false: 0 });
                let consequent = self.flatten(b, consequent, false, None)?;
                b.emit(Instr::Eval(CExpr::Assignment {
                    target: Target::Temp(result),
                    operator: AssignmentOperator::Equals,
                    value: Box::new(consequent),
                }));
                let jump_at = b.emit(Instr::Jump { target: 0 });
                let else_at = b.here();
                b.patch(branch_at, else_at);
                let alternate = self.flatten(b, alternate, false, None)?;
                b.emit(Instr::Eval(CExpr::Assignment {
                    target: Target::Temp(result),
                    operator: AssignmentOperator::Equals,
                    value: Box::new(alternate),
                }));
                let end = b.here();
                b.patch(jump_at, end);
                Ok(CExpr::Temp(result))
            }
            ExpressionType::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => {
                let hint = assignment_hint(left, right)?;
                let target = self.lower_target(b, left, contains_call(right))?;
                let value = self.flatten(b, right, statement_level, hint.as_deref())?;
                Ok(CExpr::Assignment {
                    target,
                    operator: *operator,
                    value: Box::new(value),
                })
            }
            ExpressionType::MemberExpression {
                object, property, ..
            } => {
                let property_has_call = match property {
                    MemberProperty::Computed(e) => contains_call(e),
                    MemberProperty::Identifier(_) => false,
                };
                let object = self.flatten_operand(b, object, property_has_call, None)?;
                let property = match property {
                    MemberProperty::Identifier(name) => MemberKey::Named(name.clone()),
                    MemberProperty::Computed(e) => {
                        MemberKey::Computed(Box::new(self.flatten(b, e, false, None)?))
                    }
                };
                Ok(CExpr::Member {
                    object: Box::new(object),
                    property,
                })
            }
            ExpressionType::SequenceExpression { expressions, .. } => {
                let mut out = vec![];
                for (i, e) in expressions.iter().enumerate() {
                    let later = expressions[i + 1..].iter().any(contains_call);
                    out.push(self.flatten_operand(b, e, later, None)?);
                }
                Ok(CExpr::Sequence(out))
            }
            // contains_call() returned true, so the expression has one of
            // the compound forms above
            _ => self.compile_pure(expr, hint),
        }
    }

    /// Flatten an operand and spill it to a temp when a call hoisted later
    /// in the same expression would otherwise overtake its evaluation.
    fn flatten_operand(
        &mut self,
        b: &mut BodyBuilder,
        expr: &ExpressionType,
        later_has_call: bool,
        hint: Option<&str>,
    ) -> Result<CExpr, CompileError> {
        let value = self.flatten(b, expr, false, hint)?;
        if later_has_call {
            Ok(self.spill(b, value))
        } else {
            Ok(value)
        }
    }

    fn spill(&mut self, b: &mut BodyBuilder, value: CExpr) -> CExpr {
        if matches!(
            value,
            CExpr::Literal(_) | CExpr::Temp(_) | CExpr::This | CExpr::Function(_)
        ) {
            return value;
        }
        let temp = b.alloc_temp();
        b.emit(Instr::Eval(CExpr::Assignment {
            target: Target::Temp(temp),
            operator: AssignmentOperator::Equals,
            value: Box::new(value),
        }));
        CExpr::Temp(temp)
    }

    fn lower_target(
        &mut self,
        b: &mut BodyBuilder,
        expr: &ExpressionType,
        later_has_call: bool,
    ) -> Result<Target, CompileError> {
        match expr {
            ExpressionType::Identifier(id) => Ok(self.resolve_target(&id.name)),
            ExpressionType::MemberExpression {
                object, property, ..
            } => {
                let property_has_call = match property {
                    MemberProperty::Computed(e) => contains_call(e),
                    MemberProperty::Identifier(_) => false,
                };
                let object =
                    self.flatten_operand(b, object, later_has_call || property_has_call, None)?;
                let property = match property {
                    MemberProperty::Identifier(name) => MemberKey::Named(name.clone()),
                    MemberProperty::Computed(e) => {
                        let key = self.flatten(b, e, false, None)?;
                        MemberKey::Computed(Box::new(if later_has_call {
                            self.spill(b, key)
                        } else {
                            key
                        }))
                    }
                };
                Ok(Target::Member {
                    object: Box::new(object),
                    property,
                })
            }
            _ => Err(CompileError::UnsupportedConstruct {
                what: "assignment target".to_string(),
                line: expr.get_meta().start_line,
            }),
        }
    }

    fn flatten_call(
        &mut self,
        b: &mut BodyBuilder,
        meta: &Meta,
        callee: &ExpressionType,
        arguments: &[ExpressionType],
        statement_level: bool,
    ) -> Result<CExpr, CompileError> {
        let args_have_call = arguments.iter().any(contains_call);
        let callee = match callee {
            ExpressionType::Identifier(id) => {
                let value = self.resolve_reference(&id.name);
                Callee::Plain(if args_have_call {
                    self.spill(b, value)
                } else {
                    value
                })
            }
            ExpressionType::MemberExpression {
                object, property, ..
            } => {
                let property_has_call = match property {
                    MemberProperty::Computed(e) => contains_call(e),
                    MemberProperty::Identifier(_) => false,
                };
                let object =
                    self.flatten_operand(b, object, args_have_call || property_has_call, None)?;
                let property = match property {
                    MemberProperty::Identifier(name) => MemberKey::Named(name.clone()),
                    MemberProperty::Computed(e) => {
                        let key = self.flatten(b, e, false, None)?;
                        MemberKey::Computed(Box::new(if args_have_call {
                            self.spill(b, key)
                        } else {
                            key
                        }))
                    }
                };
                Callee::Member { object, property }
            }
            ExpressionType::CallExpression { .. } | ExpressionType::NewExpression { .. } => {
                let inner = self.flatten(b, callee, false, None)?;
                Callee::Plain(inner)
            }
            other => {
                return Err(CompileError::UnsupportedConstruct {
                    what: "call callee of this form".to_string(),
                    line: other.get_meta().start_line,
                })
            }
        };
        let mut args = vec![];
        for (i, arg) in arguments.iter().enumerate() {
            let later = arguments[i + 1..].iter().any(contains_call);
            args.push(self.flatten_operand(b, arg, later, None)?);
        }
        let dest = b.alloc_temp();
        b.emit(Instr::Call(CallSite {
            dest,
            line: meta.start_line,
            step_again: statement_level,
            kind: CallKind::Invoke {
                callee,
                arguments: args,
            },
        }));
        Ok(CExpr::Temp(dest))
    }

    fn flatten_new(
        &mut self,
        b: &mut BodyBuilder,
        meta: &Meta,
        callee: &ExpressionType,
        arguments: &[ExpressionType],
        statement_level: bool,
    ) -> Result<CExpr, CompileError> {
        let name = stringify_reference(callee)?;
        let args_have_call = arguments.iter().any(contains_call);
        let constructor = {
            let value = self.flatten(b, callee, false, None)?;
            if args_have_call {
                self.spill(b, value)
            } else {
                value
            }
        };
        let mut args = vec![];
        for (i, arg) in arguments.iter().enumerate() {
            let later = arguments[i + 1..].iter().any(contains_call);
            args.push(self.flatten_operand(b, arg, later, None)?);
        }
        let dest = b.alloc_temp();
        b.emit(Instr::Call(CallSite {
            dest,
            line: meta.start_line,
            step_again: statement_level,
            kind: CallKind::Instantiate {
                constructor,
                name,
                arguments: args,
            },
        }));
        Ok(CExpr::Temp(dest))
    }

    /// Compile an expression known to contain no calls; emits nothing.
    fn compile_pure(
        &mut self,
        expr: &ExpressionType,
        hint: Option<&str>,
    ) -> Result<CExpr, CompileError> {
        Ok(match expr {
            ExpressionType::Literal(data) => CExpr::Literal(data.value.clone()),
            ExpressionType::Identifier(id) => self.resolve_reference(&id.name),
            ExpressionType::ThisExpression { .. } => CExpr::This,
            ExpressionType::ArrayExpression { elements, .. } => {
                let mut out = vec![];
                for e in elements {
                    out.push(self.compile_pure(e, None)?);
                }
                CExpr::Array(out)
            }
            ExpressionType::ObjectExpression { properties, .. } => {
                let base = hint.unwrap_or(ANONYMOUS);
                let mut out = vec![];
                for p in properties {
                    let child_hint = format!("{}.{}", base, p.key);
                    out.push((p.key.clone(), self.compile_pure(&p.value, Some(&child_hint))?));
                }
                CExpr::Object(out)
            }
            ExpressionType::FunctionExpression(f) => {
                let name = hint.unwrap_or(ANONYMOUS).to_string();
                let code = self.lower_function(f, name)?;
                CExpr::Function(Rc::new(code))
            }
            ExpressionType::UnaryExpression {
                operator, argument, ..
            } => CExpr::Unary {
                operator: *operator,
                argument: Box::new(self.compile_pure(argument, None)?),
            },
            ExpressionType::UpdateExpression {
                operator,
                argument,
                prefix,
                ..
            } => CExpr::Update {
                target: self.pure_target(argument)?,
                operator: *operator,
                prefix: *prefix,
            },
            ExpressionType::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => CExpr::Binary {
                operator: *operator,
                left: Box::new(self.compile_pure(left, None)?),
                right: Box::new(self.compile_pure(right, None)?),
            },
            ExpressionType::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => CExpr::Logical {
                operator: *operator,
                left: Box::new(self.compile_pure(left, None)?),
                right: Box::new(self.compile_pure(right, None)?),
            },
            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => CExpr::Conditional {
                test: Box::new(self.compile_pure(test, None)?),
                consequent: Box::new(self.compile_pure(consequent, None)?),
                alternate: Box::new(self.compile_pure(alternate, None)?),
            },
            ExpressionType::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => {
                let hint = assignment_hint(left, right)?;
                CExpr::Assignment {
                    target: self.pure_target(left)?,
                    operator: *operator,
                    value: Box::new(self.compile_pure(right, hint.as_deref())?),
                }
            }
            ExpressionType::MemberExpression {
                object, property, ..
            } => CExpr::Member {
                object: Box::new(self.compile_pure(object, None)?),
                property: match property {
                    MemberProperty::Identifier(name) => MemberKey::Named(name.clone()),
                    MemberProperty::Computed(e) => MemberKey::Computed(Box::new(self.compile_pure(e, None)?)),
                },
            },
            ExpressionType::SequenceExpression { expressions, .. } => {
                let mut out = vec![];
                for e in expressions {
                    out.push(self.compile_pure(e, None)?);
                }
                CExpr::Sequence(out)
            }
            ExpressionType::CallExpression { .. } | ExpressionType::NewExpression { .. } => {
                unreachable!("calls are hoisted before pure compilation")
            }
        })
    }

    fn pure_target(&mut self, expr: &ExpressionType) -> Result<Target, CompileError> {
        match expr {
            ExpressionType::Identifier(id) => Ok(self.resolve_target(&id.name)),
            ExpressionType::MemberExpression {
                object, property, ..
            } => Ok(Target::Member {
                object: Box::new(self.compile_pure(object, None)?),
                property: match property {
                    MemberProperty::Identifier(name) => MemberKey::Named(name.clone()),
                    MemberProperty::Computed(e) => MemberKey::Computed(Box::new(self.compile_pure(e, None)?)),
                },
            }),
            _ => Err(CompileError::UnsupportedConstruct {
                what: "assignment target".to_string(),
                line: expr.get_meta().start_line,
            }),
        }
    }
}

/// Name hint for a declarator initializer: only function and object-literal
/// initializers consume one.
fn declarator_hint(d: &VariableDeclaratorData, init: &ExpressionType) -> Option<String> {
    if names_functions(init) {
        Some(d.id.name.clone())
    } else {
        None
    }
}

/// Name hint for an assignment: only derived (and only derivable) when the
/// right-hand side can bind a function to the target's dotted path.
fn assignment_hint(
    left: &ExpressionType,
    right: &ExpressionType,
) -> Result<Option<String>, CompileError> {
    if names_functions(right) {
        Ok(Some(stringify_reference(left)?))
    } else {
        Ok(None)
    }
}

fn names_functions(expr: &ExpressionType) -> bool {
    matches!(
        expr,
        ExpressionType::FunctionExpression(_) | ExpressionType::ObjectExpression { .. }
    )
}

/// Whether an expression contains a call or `new` outside nested function
/// bodies.
pub fn contains_call(expr: &ExpressionType) -> bool {
    match expr {
        ExpressionType::CallExpression { .. } | ExpressionType::NewExpression { .. } => true,
        ExpressionType::Literal(_)
        | ExpressionType::Identifier(_)
        | ExpressionType::ThisExpression { .. }
        | ExpressionType::FunctionExpression(_) => false,
        ExpressionType::ArrayExpression { elements, .. } => elements.iter().any(contains_call),
        ExpressionType::ObjectExpression { properties, .. } => {
            properties.iter().any(|p| contains_call(&p.value))
        }
        ExpressionType::UnaryExpression { argument, .. } => contains_call(argument),
        ExpressionType::UpdateExpression { argument, .. } => contains_call(argument),
        ExpressionType::BinaryExpression { left, right, .. }
        | ExpressionType::LogicalExpression { left, right, .. }
        | ExpressionType::AssignmentExpression { left, right, .. } => {
            contains_call(left) || contains_call(right)
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => contains_call(test) || contains_call(consequent) || contains_call(alternate),
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            contains_call(object)
                || match property {
                    MemberProperty::Computed(e) => contains_call(e),
                    MemberProperty::Identifier(_) => false,
                }
        }
        ExpressionType::SequenceExpression { expressions, .. } => {
            expressions.iter().any(contains_call)
        }
    }
}
