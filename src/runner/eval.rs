//! Evaluation of the call-free compiled expressions.
//!
//! Every call has been hoisted out by the compiler, so evaluation here never
//! suspends: it reads and writes scope containers, the execution context,
//! temp slots and object properties, and applies the operators with the
//! debugged language's coercion rules.

use std::cell::RefCell;

use crate::compiler::code::{CExpr, MemberKey, Target};
use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, LiteralType, LogicalOperator, UnaryOperator,
    UpdateOperator,
};

use super::context::ContextRef;
use super::ds::error::RuntimeError;
use super::ds::scope::ScopeRef;
use super::ds::value::{Closure, NativeFunction, Value};

/// Everything an expression can see: the activation's scope chain, the
/// shared execution context, the `this` binding and the temp slots.
pub struct EvalEnv<'a> {
    pub scopes: &'a [ScopeRef],
    pub context: &'a ContextRef,
    pub this: &'a Value,
    pub temps: &'a RefCell<Vec<Value>>,
}

pub fn evaluate(expr: &CExpr, env: &EvalEnv) -> Result<Value, RuntimeError> {
    Ok(match expr {
        CExpr::Literal(lit) => literal_value(lit),
        CExpr::ScopeRef { depth, name } => match env.scopes[*depth].borrow().get(name) {
            Some(v) => v,
            None => {
                return Err(RuntimeError::ReferenceError(format!(
                    "{} is not defined",
                    name
                )))
            }
        },
        CExpr::ContextRef(name) => env
            .context
            .borrow()
            .get(name)
            .unwrap_or(Value::Undefined),
        CExpr::This => env.this.clone(),
        CExpr::Temp(id) => env.temps.borrow()[*id].clone(),
        CExpr::Array(elements) => {
            let mut values = vec![];
            for e in elements {
                values.push(evaluate(e, env)?);
            }
            Value::array(values)
        }
        CExpr::Object(properties) => {
            let mut object = super::ds::value::JsObject::new();
            for (key, e) in properties {
                let value = evaluate(e, env)?;
                object.properties.insert(key.clone(), value);
            }
            Value::object(object)
        }
        CExpr::Function(code) => Value::Function(Closure::new(code.clone(), env.scopes.to_vec())),
        CExpr::Unary { operator, argument } => {
            let value = evaluate(argument, env)?;
            match operator {
                UnaryOperator::Minus => Value::Number(-to_number(&value)),
                UnaryOperator::Plus => Value::Number(to_number(&value)),
                UnaryOperator::LogicalNot => Value::Boolean(!to_boolean(&value)),
                UnaryOperator::TypeOf => Value::string(type_of(&value)),
            }
        }
        CExpr::Binary {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            apply_binary(*operator, &left, &right)
        }
        CExpr::Logical {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, env)?;
            match operator {
                LogicalOperator::And => {
                    if to_boolean(&left) {
                        evaluate(right, env)?
                    } else {
                        left
                    }
                }
                LogicalOperator::Or => {
                    if to_boolean(&left) {
                        left
                    } else {
                        evaluate(right, env)?
                    }
                }
            }
        }
        CExpr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            let test = evaluate(test, env)?;
            if to_boolean(&test) {
                evaluate(consequent, env)?
            } else {
                evaluate(alternate, env)?
            }
        }
        CExpr::Assignment {
            target,
            operator,
            value,
        } => {
            let target = resolve_target(target, env)?;
            let value = match operator {
                AssignmentOperator::Equals => evaluate(value, env)?,
                _ => {
                    let old = read_target(&target, env)?;
                    let rhs = evaluate(value, env)?;
                    apply_binary(compound_operator(*operator), &old, &rhs)
                }
            };
            write_target(&target, value.clone(), env)?;
            value
        }
        CExpr::Update {
            target,
            operator,
            prefix,
        } => {
            let target = resolve_target(target, env)?;
            let old = to_number(&read_target(&target, env)?);
            let new = match operator {
                UpdateOperator::PlusPlus => old + 1.0,
                UpdateOperator::MinusMinus => old - 1.0,
            };
            write_target(&target, Value::Number(new), env)?;
            Value::Number(if *prefix { new } else { old })
        }
        CExpr::Member { object, property } => {
            let object = evaluate(object, env)?;
            let key = member_key(property, env)?;
            get_property(&object, &key)?
        }
        CExpr::Sequence(exprs) => {
            let mut last = Value::Undefined;
            for e in exprs {
                last = evaluate(e, env)?;
            }
            last
        }
    })
}

fn literal_value(lit: &LiteralType) -> Value {
    match lit {
        LiteralType::NumberLiteral(n) => Value::Number(*n),
        LiteralType::StringLiteral(s) => Value::String(s.clone()),
        LiteralType::BooleanLiteral(b) => Value::Boolean(*b),
        LiteralType::NullLiteral => Value::Null,
        LiteralType::UndefinedLiteral => Value::Undefined,
    }
}

fn member_key(property: &MemberKey, env: &EvalEnv) -> Result<String, RuntimeError> {
    Ok(match property {
        MemberKey::Named(name) => name.clone(),
        MemberKey::Computed(e) => property_key(&evaluate(e, env)?),
    })
}

/// Convert a value into a property key string.
pub fn property_key(value: &Value) -> String {
    value.to_string()
}

// ---------------------------------------------------------------------------
// Assignment targets
// ---------------------------------------------------------------------------

/// A target with its member base evaluated exactly once, so compound
/// assignments and updates read and write the same location.
enum ResolvedTarget {
    Scope { depth: usize, name: String },
    Context(String),
    Temp(usize),
    Member { object: Value, key: String },
}

fn resolve_target(target: &Target, env: &EvalEnv) -> Result<ResolvedTarget, RuntimeError> {
    Ok(match target {
        Target::Scope { depth, name } => ResolvedTarget::Scope {
            depth: *depth,
            name: name.clone(),
        },
        Target::Context(name) => ResolvedTarget::Context(name.clone()),
        Target::Temp(id) => ResolvedTarget::Temp(*id),
        Target::Member { object, property } => ResolvedTarget::Member {
            object: evaluate(object, env)?,
            key: member_key(property, env)?,
        },
    })
}

fn read_target(target: &ResolvedTarget, env: &EvalEnv) -> Result<Value, RuntimeError> {
    Ok(match target {
        ResolvedTarget::Scope { depth, name } => env.scopes[*depth]
            .borrow()
            .get(name)
            .unwrap_or(Value::Undefined),
        ResolvedTarget::Context(name) => env
            .context
            .borrow()
            .get(name)
            .unwrap_or(Value::Undefined),
        ResolvedTarget::Temp(id) => env.temps.borrow()[*id].clone(),
        ResolvedTarget::Member { object, key } => get_property(object, key)?,
    })
}

fn write_target(
    target: &ResolvedTarget,
    value: Value,
    env: &EvalEnv,
) -> Result<(), RuntimeError> {
    match target {
        ResolvedTarget::Scope { depth, name } => {
            let mut scope = env.scopes[*depth].borrow_mut();
            if !scope.set(name, value.clone()) {
                scope.declare(name, value);
            }
        }
        ResolvedTarget::Context(name) => {
            env.context.borrow_mut().set(name, value);
        }
        ResolvedTarget::Temp(id) => {
            env.temps.borrow_mut()[*id] = value;
        }
        ResolvedTarget::Member { object, key } => set_property(object, key, value)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Property access
// ---------------------------------------------------------------------------

pub fn get_property(object: &Value, key: &str) -> Result<Value, RuntimeError> {
    Ok(match object {
        Value::Object(o) => o.borrow().lookup(key).unwrap_or(Value::Undefined),
        Value::Array(a) => {
            if key == "length" {
                Value::Number(a.borrow().len() as f64)
            } else if let Ok(index) = key.parse::<usize>() {
                a.borrow().get(index).cloned().unwrap_or(Value::Undefined)
            } else {
                Value::Undefined
            }
        }
        Value::Function(c) => c
            .properties
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(Value::Undefined),
        Value::String(s) => match key {
            "length" => Value::Number(s.chars().count() as f64),
            "toString" => NativeFunction::new("toString", |this, _args| Ok(this)).into(),
            _ => Value::Undefined,
        },
        Value::Number(_) | Value::Boolean(_) => match key {
            "toString" => {
                NativeFunction::new("toString", |this, _args| Ok(Value::string(this.to_string())))
                    .into()
            }
            _ => Value::Undefined,
        },
        Value::Native(_) => Value::Undefined,
        Value::Undefined | Value::Null => {
            return Err(RuntimeError::TypeError(format!(
                "cannot read property '{}' of {}",
                key, object
            )))
        }
    })
}

pub fn set_property(object: &Value, key: &str, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::Object(o) => {
            o.borrow_mut().properties.insert(key.to_string(), value);
        }
        Value::Array(a) => {
            if let Ok(index) = key.parse::<usize>() {
                let mut items = a.borrow_mut();
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
            }
        }
        Value::Function(c) => {
            c.properties.borrow_mut().insert(key.to_string(), value);
        }
        Value::Native(_) | Value::String(_) | Value::Number(_) | Value::Boolean(_) => {}
        Value::Undefined | Value::Null => {
            return Err(RuntimeError::TypeError(format!(
                "cannot set property '{}' of {}",
                key, object
            )))
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Coercions and operators
// ---------------------------------------------------------------------------

pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Null => "object",
        Value::Boolean(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "object",
        Value::Function(_) | Value::Native(_) => "function",
    }
}

fn compound_operator(op: AssignmentOperator) -> BinaryOperator {
    match op {
        AssignmentOperator::AddEquals => BinaryOperator::Add,
        AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
        AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
        AssignmentOperator::DivideEquals => BinaryOperator::Divide,
        AssignmentOperator::ModuloEquals => BinaryOperator::Modulo,
        AssignmentOperator::Equals => unreachable!("plain assignment has no binary step"),
    }
}

fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOperator::Add => js_add(left, right),
        BinaryOperator::Subtract => Value::Number(to_number(left) - to_number(right)),
        BinaryOperator::Multiply => Value::Number(to_number(left) * to_number(right)),
        BinaryOperator::Divide => Value::Number(to_number(left) / to_number(right)),
        BinaryOperator::Modulo => Value::Number(to_number(left) % to_number(right)),
        BinaryOperator::StrictlyEqual => Value::Boolean(left == right),
        BinaryOperator::StrictlyUnequal => Value::Boolean(left != right),
        BinaryOperator::LooselyEqual => Value::Boolean(loose_equals(left, right)),
        BinaryOperator::LooselyUnequal => Value::Boolean(!loose_equals(left, right)),
        BinaryOperator::LessThan => compare(left, right, |o| o == std::cmp::Ordering::Less),
        BinaryOperator::LessThanEqual => compare(left, right, |o| o != std::cmp::Ordering::Greater),
        BinaryOperator::GreaterThan => compare(left, right, |o| o == std::cmp::Ordering::Greater),
        BinaryOperator::GreaterThanEqual => compare(left, right, |o| o != std::cmp::Ordering::Less),
    }
}

fn js_add(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            Value::String(format!("{}{}", left, right))
        }
        _ => Value::Number(to_number(left) + to_number(right)),
    }
}

fn compare<F>(left: &Value, right: &Value, f: F) -> Value
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    };
    match ordering {
        Some(o) => Value::Boolean(f(o)),
        None => Value::Boolean(false), // NaN on either side
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Null) | (Value::Null, Value::Undefined) => true,
        (Value::Number(n), Value::String(_)) => *n == to_number(right),
        (Value::String(_), Value::Number(n)) => to_number(left) == *n,
        (Value::Boolean(_), _) => loose_equals(&Value::Number(to_number(left)), right),
        (_, Value::Boolean(_)) => loose_equals(left, &Value::Number(to_number(right))),
        _ => left == right,
    }
}
