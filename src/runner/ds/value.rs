//! Runtime values.
//!
//! Numbers follow the debugged language's semantics end to end (a single
//! `f64` representation). Arrays, objects and functions are shared by
//! reference; equality on them is pointer identity.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::compiler::code::FunctionCode;

use super::error::RuntimeError;
use super::scope::ScopeRef;

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type ObjectRef = Rc<RefCell<JsObject>>;

pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<Closure>),
    Native(NativeFunction),
}

impl Value {
    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    pub fn object(object: JsObject) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Undefined => Value::Undefined,
            Value::Null => Value::Null,
            Value::Boolean(b) => Value::Boolean(*b),
            Value::Number(n) => Value::Number(*n),
            Value::String(s) => Value::String(s.clone()),
            Value::Array(a) => Value::Array(a.clone()),
            Value::Object(o) => Value::Object(o.clone()),
            Value::Function(f) => Value::Function(f.clone()),
            Value::Native(f) => Value::Native(f.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(&a.f, &b.f),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(a) => {
                let parts = a
                    .borrow()
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{}", parts)
            }
            Value::Object(o) => match &o.borrow().class_name {
                Some(name) => write!(f, "[object {}]", name),
                None => write!(f, "[object Object]"),
            },
            Value::Function(c) => write!(f, "function {}", c.code.name),
            Value::Native(n) => write!(f, "function {}", n.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Value::Undefined"),
            Value::Null => write!(f, "Value::Null"),
            Value::Boolean(b) => write!(f, "Value::Boolean({})", b),
            Value::Number(n) => write!(f, "Value::Number({})", n),
            Value::String(s) => write!(f, "Value::String({:?})", s),
            Value::Array(a) => write!(f, "Value::Array({:?})", a.borrow()),
            Value::Object(_) => write!(f, "Value::Object(..)"),
            Value::Function(c) => write!(f, "Value::Function({})", c.code.name),
            Value::Native(n) => write!(f, "Value::Native({})", n.name),
        }
    }
}

/// Format a number the way the debugged language prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A plain object: property map, prototype link, and the constructor
/// display name attached by the instantiate hook.
pub struct JsObject {
    pub properties: HashMap<String, Value>,
    pub prototype: Option<ObjectRef>,
    pub class_name: Option<String>,
}

impl JsObject {
    pub fn new() -> JsObject {
        JsObject {
            properties: HashMap::new(),
            prototype: None,
            class_name: None,
        }
    }

    pub fn with_class(prototype: Option<ObjectRef>, class_name: &str) -> JsObject {
        JsObject {
            properties: HashMap::new(),
            prototype,
            class_name: Some(class_name.to_string()),
        }
    }

    /// Own property, then the prototype chain.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        if let Some(v) = self.properties.get(key) {
            return Some(v.clone());
        }
        let mut proto = self.prototype.clone();
        while let Some(p) = proto {
            let p = p.borrow();
            if let Some(v) = p.properties.get(key) {
                return Some(v.clone());
            }
            proto = p.prototype.clone();
        }
        None
    }
}

impl Default for JsObject {
    fn default() -> Self {
        JsObject::new()
    }
}

/// A compiled user function together with the scope chain it closed over.
/// Carries its own property map so that `prototype` members work; the
/// `prototype` object is created eagerly, as constructors need it.
pub struct Closure {
    pub code: Rc<FunctionCode>,
    pub env: Vec<ScopeRef>,
    pub properties: RefCell<HashMap<String, Value>>,
}

impl Closure {
    pub fn new(code: Rc<FunctionCode>, env: Vec<ScopeRef>) -> Rc<Closure> {
        let mut properties = HashMap::new();
        properties.insert("prototype".to_string(), Value::object(JsObject::new()));
        Rc::new(Closure {
            code,
            env,
            properties: RefCell::new(properties),
        })
    }

    pub fn prototype_object(&self) -> Option<ObjectRef> {
        match self.properties.borrow().get("prototype") {
            Some(Value::Object(o)) => Some(o.clone()),
            _ => None,
        }
    }
}

/// A host function callable from debugged code. Runs synchronously to
/// completion while the suspension that invoked it is being resolved.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    f: Rc<dyn Fn(Value, Vec<Value>) -> Result<Value, RuntimeError>>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, f: F) -> NativeFunction
    where
        F: Fn(Value, Vec<Value>) -> Result<Value, RuntimeError> + 'static,
    {
        NativeFunction {
            name: name.into(),
            f: Rc::new(f),
        }
    }

    pub fn call(&self, this: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.f)(this, args)
    }
}

impl From<NativeFunction> for Value {
    fn from(f: NativeFunction) -> Value {
        Value::Native(f)
    }
}
