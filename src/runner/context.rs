//! The execution context: the name table debugged code runs against, plus
//! the constructor-instantiation hook.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::activation::{Activation, Invocation};
use super::ds::error::RuntimeError;
use super::ds::value::{JsObject, Value};

pub type ContextRef = Rc<RefCell<ExecutionContext>>;

/// Notification raised for every constructor invocation:
/// `(constructor, display_name, instance, args)`.
pub type NewObjectHook = Rc<dyn Fn(&Value, &str, &Value, &[Value])>;

/// Insertion-ordered name -> value table shared by reference across every
/// activation of a program. User code mutates it freely; unresolved
/// identifiers also read and write here.
pub struct ExecutionContext {
    entries: Vec<(String, Value)>,
    /// Marker set by the debugger facade once the context is wired up.
    pub prepared_for_debugging: bool,
    on_new_object: Option<NewObjectHook>,
}

impl ExecutionContext {
    pub fn new() -> ExecutionContext {
        ExecutionContext {
            entries: vec![],
            prepared_for_debugging: false,
            on_new_object: None,
        }
    }

    pub fn into_shared(self) -> ContextRef {
        Rc::new(RefCell::new(self))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn set_on_new_object(&mut self, hook: NewObjectHook) {
        self.on_new_object = Some(hook);
    }

    fn new_object_hook(&self) -> Option<NewObjectHook> {
        self.on_new_object.clone()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        ExecutionContext::new()
    }
}

/// The `__instantiate__` hook: construct a fresh instance of `constructor`,
/// forwarding the resulting activation when the constructor is itself
/// steppable so the interpreter can step through it. The instance carries
/// the constructor's display name.
pub fn instantiate(
    context: &ContextRef,
    constructor: Value,
    display_name: &str,
    args: Vec<Value>,
) -> Result<Invocation, RuntimeError> {
    match constructor {
        Value::Function(closure) => {
            let instance = Rc::new(RefCell::new(JsObject {
                properties: HashMap::new(),
                prototype: closure.prototype_object(),
                class_name: Some(display_name.to_string()),
            }));
            notify_new_object(
                context,
                &Value::Function(closure.clone()),
                display_name,
                &Value::Object(instance.clone()),
                &args,
            );
            Ok(Invocation::Activation(Box::new(Activation::from_closure(
                &closure,
                Value::Object(instance.clone()),
                args,
                context,
                Some(instance),
            ))))
        }
        Value::Native(native) => {
            let instance = Rc::new(RefCell::new(JsObject::with_class(None, display_name)));
            notify_new_object(
                context,
                &Value::Native(native.clone()),
                display_name,
                &Value::Object(instance.clone()),
                &args,
            );
            native.call(Value::Object(instance.clone()), args)?;
            Ok(Invocation::Completed(Value::Object(instance)))
        }
        other => Err(RuntimeError::TypeError(format!(
            "{} is not a constructor",
            other
        ))),
    }
}

fn notify_new_object(
    context: &ContextRef,
    constructor: &Value,
    display_name: &str,
    instance: &Value,
    args: &[Value],
) {
    // clone the hook out so user callbacks run without the context borrowed
    let hook = context.borrow().new_object_hook();
    if let Some(hook) = hook {
        hook(constructor, display_name, instance, args);
    }
}
