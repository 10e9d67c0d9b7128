//! Tests for the debugger facade: lifecycle hooks, step forwarding, the
//! breakpoint API and the task registry.

extern crate stepjs;

use std::cell::RefCell;
use std::rc::Rc;

use stepjs::compiler::CompileError;
use stepjs::runner::context::ExecutionContext;
use stepjs::runner::debugger::{Debugger, DebuggerEvents, StackEntry};
use stepjs::runner::ds::value::{NativeFunction, Value};

fn n(value: f64) -> Value {
    Value::Number(value)
}

fn basic_context() -> ExecutionContext {
    let mut context = ExecutionContext::new();
    context.set("x", n(0.0));
    context.set("y", n(0.0));
    context.set(
        "fill",
        Value::Native(NativeFunction::new("fill", |_this, _args| {
            Ok(Value::Undefined)
        })),
    );
    context
}

#[test]
fn test_load_and_run_to_completion() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger.load("x = 5;").unwrap();
    debugger.start(false).unwrap();
    assert_eq!(debugger.context().borrow().get("x"), Some(n(5.0)));
    assert!(!debugger.paused());
}

#[test]
fn test_load_reports_compile_errors() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    let err = debugger.load("var x = ;").unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn test_context_is_marked_prepared() {
    let debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    assert!(debugger.context().borrow().prepared_for_debugging);
}

#[test]
fn test_start_paused_stops_on_the_first_line() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger.load("x = 5;\ny = 10;").unwrap();
    debugger.start(true).unwrap();
    assert!(debugger.paused());
    assert_eq!(debugger.current_line(), Some(1));
    assert_eq!(debugger.context().borrow().get("x"), Some(n(0.0)));

    debugger.step_over().unwrap();
    assert_eq!(debugger.current_line(), Some(2));
    assert_eq!(debugger.context().borrow().get("x"), Some(n(5.0)));

    debugger.resume().unwrap();
    assert!(!debugger.paused());
    assert_eq!(debugger.context().borrow().get("y"), Some(n(10.0)));
}

#[test]
fn test_step_operations_are_ignored_unless_paused() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger.load("x = 5;").unwrap();
    debugger.step_over().unwrap();
    debugger.step_in().unwrap();
    debugger.step_out().unwrap();
    assert_eq!(debugger.context().borrow().get("x"), Some(n(0.0)));
}

#[test]
fn test_breakpoints_via_the_facade() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger.load("x = 5;\ny = 10;\nx = 20;").unwrap();
    debugger.set_breakpoint(2);
    debugger.start(false).unwrap();
    assert!(debugger.paused());
    assert_eq!(debugger.current_line(), Some(2));
    assert_eq!(debugger.context().borrow().get("y"), Some(n(0.0)));

    debugger.clear_breakpoint(2);
    debugger.resume().unwrap();
    assert_eq!(debugger.context().borrow().get("x"), Some(n(20.0)));
}

#[test]
fn test_breakpoints_toggle() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger.load("x = 5;\ny = 10;").unwrap();
    debugger.set_breakpoint(2);
    debugger.set_breakpoints_enabled(false);
    debugger.start(false).unwrap();
    assert!(!debugger.paused());
    assert_eq!(debugger.context().borrow().get("y"), Some(n(10.0)));

    debugger.set_breakpoints_enabled(true);
    debugger.start(false).unwrap();
    assert!(debugger.paused());
    assert_eq!(debugger.current_line(), Some(2));
}

#[test]
fn test_lifecycle_events() {
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(vec![]));

    let mut events = DebuggerEvents::default();
    let main_start_log = log.clone();
    events.on_main_start = Some(Box::new(move || {
        main_start_log.borrow_mut().push("main-start".to_string());
    }));
    let main_done_log = log.clone();
    events.on_main_done = Some(Box::new(move || {
        main_done_log.borrow_mut().push("main-done".to_string());
    }));
    let function_done_log = log.clone();
    events.on_function_done = Some(Box::new(move || {
        function_done_log.borrow_mut().push("function-done".to_string());
    }));
    let breakpoint_log = log.clone();
    events.on_breakpoint = Some(Box::new(move || {
        breakpoint_log.borrow_mut().push("breakpoint".to_string());
    }));

    let mut debugger = Debugger::new(basic_context(), events);
    debugger
        .load("var foo = function () {\n    x = 5;\n};\nfoo();")
        .unwrap();
    debugger.set_breakpoint(2);
    debugger.start(false).unwrap();
    assert_eq!(
        log.borrow().as_slice(),
        ["main-start".to_string(), "breakpoint".to_string()]
    );

    debugger.resume().unwrap();
    assert_eq!(
        log.borrow().as_slice(),
        [
            "main-start".to_string(),
            "breakpoint".to_string(),
            "function-done".to_string(), // foo's activation completes
            "function-done".to_string(), // the main program completes
            "main-done".to_string(),
        ]
    );
}

#[test]
fn test_on_new_object_notification() {
    let seen: Rc<RefCell<Vec<(String, Vec<Value>)>>> = Rc::new(RefCell::new(vec![]));
    let seen_hook = seen.clone();

    let mut events = DebuggerEvents::default();
    events.on_new_object = Some(Box::new(move |_constructor, name, instance, args| {
        assert!(matches!(instance, Value::Object(_)));
        seen_hook
            .borrow_mut()
            .push((name.to_string(), args.to_vec()));
    }));

    let mut debugger = Debugger::new(basic_context(), events);
    debugger
        .load("function Point(a,b) {\n    this.a = a;\n    this.b = b;\n}\nx = new Point(5,10);")
        .unwrap();
    debugger.start(false).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "Point");
    assert_eq!(seen[0].1, vec![n(5.0), n(10.0)]);
}

#[test]
fn test_current_stack_innermost_first() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger
        .load("var foo = function () {\n    x = 5;\n    y = 10;\n};\nfoo();")
        .unwrap();
    debugger.set_breakpoint(3);
    debugger.start(false).unwrap();
    assert!(debugger.paused());
    assert_eq!(
        debugger.current_stack(),
        vec![
            StackEntry {
                name: "foo".to_string(),
                line: 3
            },
            StackEntry {
                name: "<PROGRAM>".to_string(),
                line: 5
            },
        ]
    );

    let scope = debugger.current_scope().unwrap();
    assert!(scope.borrow().is_empty()); // foo declares no locals
}

#[test]
fn test_restart_runs_a_fresh_program_object() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger.load("x = x + 1;").unwrap();
    debugger.start(false).unwrap();
    debugger.start(false).unwrap();
    assert_eq!(debugger.context().borrow().get("x"), Some(n(2.0)));
}

#[test]
fn test_queue_function_registers_a_task() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger
        .load("draw = function () {\n    x = x + 1;\n};")
        .unwrap();
    debugger.start(false).unwrap();

    let draw = debugger.context().borrow().get("draw").unwrap();
    debugger.queue_function(&draw);

    // the main task has finished, so the queued one is current
    let task = debugger.current_task().expect("queued task is current");
    task.borrow_mut().run().unwrap();
    assert_eq!(debugger.context().borrow().get("x"), Some(n(1.0)));
}

#[test]
fn test_queue_function_ignored_after_stop() {
    let mut debugger = Debugger::new(basic_context(), DebuggerEvents::default());
    debugger
        .load("draw = function () {\n    x = x + 1;\n};")
        .unwrap();
    debugger.start(false).unwrap();
    let draw = debugger.context().borrow().get("draw").unwrap();

    debugger.stop();
    debugger.queue_function(&draw);
    assert!(debugger.current_task().is_none());
}
