//! The debugger facade.
//!
//! Owns the execution context, the breakpoint set and the task registry;
//! compiles source on `load`, creates steppers on `start`, forwards step
//! operations to whichever stepper is current, and raises the lifecycle
//! hooks.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::compiler::code::InstrumentedProgram;
use crate::compiler::{compile, CompileError, CompileOptions, Language};

use super::activation::Activation;
use super::breakpoints::{BreakpointSet, BreakpointSetRef};
use super::context::{ContextRef, ExecutionContext};
use super::ds::error::RuntimeError;
use super::ds::scope::ScopeRef;
use super::ds::value::Value;
use super::scheduler::{Scheduler, SharedStepper};
use super::stepper::{Stepper, StepperCallbacks};

/// Lifecycle notification hooks. All optional; none returns a value.
#[derive(Default)]
pub struct DebuggerEvents {
    /// Entering the top-level program.
    pub on_main_start: Option<Box<dyn Fn()>>,
    /// The top-level program completed.
    pub on_main_done: Option<Box<dyn Fn()>>,
    /// A stepper paused (breakpoint or step boundary).
    pub on_breakpoint: Option<Box<dyn Fn()>>,
    /// An activation completed.
    pub on_function_done: Option<Box<dyn Fn()>>,
    /// A constructor was invoked: `(constructor, display_name, instance,
    /// args)`.
    pub on_new_object: Option<Box<dyn Fn(&Value, &str, &Value, &[Value])>>,
}

/// Stack entry as reported to display layers.
#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry {
    pub name: String,
    pub line: i32,
}

pub struct Debugger {
    context: ContextRef,
    breakpoints: BreakpointSetRef,
    scheduler: Scheduler,
    program: Option<Rc<InstrumentedProgram>>,
    language: Language,
    paused: Rc<Cell<bool>>,
    done: bool,
    events: Rc<DebuggerEvents>,
}

impl Debugger {
    /// Wrap `context` for debugging: installs the instantiate notification
    /// hook and marks the context as prepared.
    pub fn new(context: ExecutionContext, events: DebuggerEvents) -> Debugger {
        let events = Rc::new(events);
        let context = context.into_shared();
        {
            let mut ctx = context.borrow_mut();
            ctx.prepared_for_debugging = true;
            let hook_events = events.clone();
            ctx.set_on_new_object(Rc::new(move |constructor, name, instance, args| {
                if let Some(hook) = &hook_events.on_new_object {
                    hook(constructor, name, instance, args);
                }
            }));
        }
        Debugger {
            context,
            breakpoints: BreakpointSet::new().into_shared(),
            scheduler: Scheduler::new(),
            program: None,
            language: Language::default(),
            paused: Rc::new(Cell::new(false)),
            done: false,
            events,
        }
    }

    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Compile `code` against the current context and cache the result.
    pub fn load(&mut self, code: &str) -> Result<(), CompileError> {
        let names: HashSet<String> = self.context.borrow().names().into_iter().collect();
        let options = CompileOptions {
            language: self.language,
            dump_instrumented: false,
        };
        self.program = Some(Rc::new(compile(code, &names, &options)?));
        Ok(())
    }

    /// Begin a fresh run of the loaded program. `paused` stops on the first
    /// line instead of running to the first breakpoint or completion.
    pub fn start(&mut self, paused: bool) -> Result<(), RuntimeError> {
        let program = match &self.program {
            Some(p) => p.clone(),
            None => return Ok(()),
        };
        self.scheduler.clear();
        self.done = false;
        if let Some(hook) = &self.events.on_main_start {
            hook();
        }
        let activation = program.instantiate(&self.context);
        let stepper = self.create_stepper(activation, true);
        self.scheduler.add_task(stepper.clone());
        let result = stepper.borrow_mut().start(paused);
        result
    }

    /// Register an additional stepper for a compiled function value, for
    /// hosts that schedule instrumented callbacks (draw loops and the
    /// like). Ignored once the session is stopped.
    pub fn queue_function(&mut self, function: &Value) {
        if self.done {
            return;
        }
        if let Value::Function(closure) = function {
            let activation =
                Activation::from_closure(closure, Value::Undefined, vec![], &self.context, None);
            let stepper = self.create_stepper(activation, false);
            self.scheduler.add_task(stepper);
        }
    }

    /// Mark the session done; no further tasks are queued.
    pub fn stop(&mut self) {
        self.done = true;
    }

    pub fn resume(&mut self) -> Result<(), RuntimeError> {
        if self.paused.get() {
            self.paused.set(false);
            if let Some(task) = self.scheduler.current_task() {
                return task.borrow_mut().resume();
            }
        }
        Ok(())
    }

    pub fn step_in(&mut self) -> Result<(), RuntimeError> {
        if self.paused.get() {
            if let Some(task) = self.scheduler.current_task() {
                return task.borrow_mut().step_in();
            }
        }
        Ok(())
    }

    pub fn step_over(&mut self) -> Result<(), RuntimeError> {
        if self.paused.get() {
            if let Some(task) = self.scheduler.current_task() {
                return task.borrow_mut().step_over();
            }
        }
        Ok(())
    }

    pub fn step_out(&mut self) -> Result<(), RuntimeError> {
        if self.paused.get() {
            if let Some(task) = self.scheduler.current_task() {
                return task.borrow_mut().step_out();
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Breakpoints
    // -----------------------------------------------------------------------

    pub fn set_breakpoint(&self, line: u32) {
        self.breakpoints.borrow_mut().set(line);
    }

    pub fn clear_breakpoint(&self, line: u32) {
        self.breakpoints.borrow_mut().clear(line);
    }

    pub fn set_breakpoints_enabled(&self, enabled: bool) {
        self.breakpoints.borrow_mut().set_enabled(enabled);
    }

    pub fn breakpoints(&self) -> BreakpointSetRef {
        self.breakpoints.clone()
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn paused(&self) -> bool {
        self.paused.get()
    }

    /// Line of the current stepper while paused.
    pub fn current_line(&self) -> Option<i32> {
        if !self.paused.get() {
            return None;
        }
        self.scheduler.current_task().map(|t| t.borrow().line())
    }

    /// Stack of the current stepper, innermost frame first.
    pub fn current_stack(&self) -> Vec<StackEntry> {
        match self.scheduler.current_task() {
            Some(task) => task
                .borrow()
                .frames()
                .into_iter()
                .map(|f| StackEntry {
                    name: f.name,
                    line: f.line,
                })
                .collect(),
            None => vec![],
        }
    }

    /// Scope container of the current stepper's innermost frame.
    pub fn current_scope(&self) -> Option<ScopeRef> {
        self.scheduler
            .current_task()
            .and_then(|t| t.borrow().scope())
    }

    pub fn current_task(&self) -> Option<SharedStepper> {
        self.scheduler.current_task()
    }

    // -----------------------------------------------------------------------

    fn create_stepper(&self, activation: Activation, is_main: bool) -> SharedStepper {
        let break_flag = self.paused.clone();
        let break_events = self.events.clone();
        let on_break: Rc<dyn Fn()> = Rc::new(move || {
            break_flag.set(true);
            if let Some(hook) = &break_events.on_breakpoint {
                hook();
            }
        });

        let done_flag = self.paused.clone();
        let done_events = self.events.clone();
        let on_done: Rc<dyn Fn()> = Rc::new(move || {
            done_flag.set(false);
            if let Some(hook) = &done_events.on_function_done {
                hook();
            }
            if is_main {
                if let Some(hook) = &done_events.on_main_done {
                    hook();
                }
            }
        });

        let frame_events = self.events.clone();
        let on_frame_done: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(hook) = &frame_events.on_function_done {
                hook();
            }
        });

        Rc::new(std::cell::RefCell::new(Stepper::new(
            activation,
            self.breakpoints.clone(),
            StepperCallbacks {
                on_break: Some(on_break),
                on_done: Some(on_done),
                on_frame_done: Some(on_frame_done),
            },
        )))
    }
}
