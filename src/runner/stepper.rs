//! The stepping interpreter.
//!
//! A `Stepper` drives one program object (and every nested activation
//! reached through its calls) one suspension at a time. It owns the call
//! stack, discriminates stepping into from stepping over nested
//! invocations, consults the breakpoint set on every statement boundary,
//! and reports completion.

use std::mem;

use log::trace;

use super::activation::{Activation, Invocation, Resumption, Suspension};
use super::breakpoints::BreakpointSetRef;
use super::ds::error::RuntimeError;
use super::ds::scope::ScopeRef;
use super::ds::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PauseState {
    NotStarted,
    Running,
    Paused,
    Stopped,
}

/// One active activation on the stepper's stack.
struct StackFrame {
    activation: Activation,
    name: String,
    line: i32,
    scope: ScopeRef,
}

/// Snapshot of a frame for display.
#[derive(Clone)]
pub struct FrameInfo {
    pub name: String,
    pub line: i32,
    pub scope: ScopeRef,
}

/// Notification hooks: pause, a nested activation completing, and overall
/// completion. Pure notifications with no return value.
#[derive(Default, Clone)]
pub struct StepperCallbacks {
    pub on_break: Option<std::rc::Rc<dyn Fn()>>,
    pub on_done: Option<std::rc::Rc<dyn Fn()>>,
    pub on_frame_done: Option<std::rc::Rc<dyn Fn()>>,
}

enum RawStep {
    /// The outermost activation completed; the stepper is stopped.
    Done,
    /// A nested activation completed; control is back in its caller.
    PoppedFrame,
    Suspended(Suspension),
}

enum DriveStop {
    Completed,
    Breakpoint,
    FrameReturned,
}

pub struct Stepper {
    stack: Vec<StackFrame>,
    breakpoints: BreakpointSetRef,
    callbacks: StepperCallbacks,
    state: PauseState,
    /// Value delivered to the innermost activation on its next resume: the
    /// result of the invocation it is suspended on.
    ret_val: Value,
}

impl Stepper {
    pub fn new(
        activation: Activation,
        breakpoints: BreakpointSetRef,
        callbacks: StepperCallbacks,
    ) -> Stepper {
        let mut stepper = Stepper {
            stack: vec![],
            breakpoints,
            callbacks,
            state: PauseState::NotStarted,
            ret_val: Value::Undefined,
        };
        stepper.push_frame(activation);
        stepper
    }

    // -----------------------------------------------------------------------
    // Driving operations
    // -----------------------------------------------------------------------

    /// Begin execution: paused on the first line when `paused`, otherwise
    /// run until a breakpoint or completion.
    pub fn start(&mut self, paused: bool) -> Result<(), RuntimeError> {
        if self.state == PauseState::Stopped {
            return Ok(());
        }
        if paused {
            self.state = PauseState::Running;
            if let RawStep::Suspended(_) | RawStep::PoppedFrame = self._step()? {
                self.pause();
            }
            Ok(())
        } else {
            self.run()
        }
    }

    /// Drive across all nested activations until a breakpoint or overall
    /// completion. A no-op once stopped.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        if self.state == PauseState::Stopped {
            return Ok(());
        }
        self.state = PauseState::Running;
        self.drive(0)?;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), RuntimeError> {
        self.run()
    }

    /// Advance one caller-visible statement in the innermost activation,
    /// driving any nested invocation to completion internally. Breakpoints
    /// inside the stepped-over callee still pause.
    pub fn step_over(&mut self) -> Result<(), RuntimeError> {
        if self.state == PauseState::Stopped {
            return Ok(());
        }
        self.state = PauseState::Running;
        match self._step()? {
            RawStep::Done => {}
            RawStep::PoppedFrame => self.pause(),
            RawStep::Suspended(susp) => match susp.invocation {
                Some(Invocation::Completed(value)) => {
                    self.ret_val = value;
                    if susp.step_again {
                        self.advance_extra()?;
                    }
                    self.pause_if_running();
                }
                Some(Invocation::Activation(activation)) => {
                    let depth = self.stack.len();
                    self.push_frame(*activation);
                    match self.drive(depth + 1)? {
                        DriveStop::Completed | DriveStop::Breakpoint => {}
                        DriveStop::FrameReturned => {
                            if susp.step_again {
                                self.advance_extra()?;
                            }
                            self.pause_if_running();
                        }
                    }
                }
                None => self.pause_if_running(),
            },
        }
        Ok(())
    }

    /// Advance one suspension; a steppable invocation becomes a new frame
    /// paused at its first line, a native one behaves like `step_over`.
    pub fn step_in(&mut self) -> Result<(), RuntimeError> {
        if self.state == PauseState::Stopped {
            return Ok(());
        }
        self.state = PauseState::Running;
        match self._step()? {
            RawStep::Done => {}
            RawStep::PoppedFrame => self.pause(),
            RawStep::Suspended(susp) => match susp.invocation {
                Some(Invocation::Activation(activation)) => {
                    self.push_frame(*activation);
                    // stop at the callee's first suspension
                    if let RawStep::Suspended(_) | RawStep::PoppedFrame = self._step()? {
                        self.pause_if_running();
                    }
                }
                Some(Invocation::Completed(value)) => {
                    self.ret_val = value;
                    if susp.step_again {
                        self.advance_extra()?;
                    }
                    self.pause_if_running();
                }
                None => self.pause_if_running(),
            },
        }
        Ok(())
    }

    /// Drive the innermost activation to completion, honoring breakpoints
    /// on the way, then pause in the caller at the call-site line. With no
    /// caller this behaves like `run`.
    pub fn step_out(&mut self) -> Result<(), RuntimeError> {
        if self.state == PauseState::Stopped {
            return Ok(());
        }
        self.state = PauseState::Running;
        let depth = self.stack.len();
        match self.drive(depth)? {
            DriveStop::Completed | DriveStop::Breakpoint => {}
            DriveStop::FrameReturned => self.pause(),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Breakpoint set
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

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn stopped(&self) -> bool {
        self.state == PauseState::Stopped
    }

    pub fn paused(&self) -> bool {
        self.state == PauseState::Paused
    }

    /// Line of the innermost frame, or -1 once the stack is empty.
    pub fn line(&self) -> i32 {
        self.stack.last().map(|f| f.line).unwrap_or(-1)
    }

    /// Frames for display, innermost first.
    pub fn frames(&self) -> Vec<FrameInfo> {
        self.stack
            .iter()
            .rev()
            .map(|f| FrameInfo {
                name: f.name.clone(),
                line: f.line,
                scope: f.scope.clone(),
            })
            .collect()
    }

    pub fn current_frame(&self) -> Option<FrameInfo> {
        self.stack.last().map(|f| FrameInfo {
            name: f.name.clone(),
            line: f.line,
            scope: f.scope.clone(),
        })
    }

    /// Scope container of the innermost frame.
    pub fn scope(&self) -> Option<ScopeRef> {
        self.stack.last().map(|f| f.scope.clone())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Resume the innermost activation once. Pops completed frames,
    /// keeps the top frame's line/name/scope current, and surfaces the
    /// suspension for the caller to dispatch.
    fn _step(&mut self) -> Result<RawStep, RuntimeError> {
        let sent = mem::replace(&mut self.ret_val, Value::Undefined);
        let frame = match self.stack.last_mut() {
            Some(frame) => frame,
            None => {
                self.finish();
                return Ok(RawStep::Done);
            }
        };
        match frame.activation.resume(sent) {
            Err(e) => {
                // unrecoverable: callers must treat the stepper as stopped
                self.state = PauseState::Stopped;
                Err(e)
            }
            Ok(Resumption::Completed(value)) => {
                let finished = self.stack.pop().unwrap();
                trace!("activation {} completed", finished.name);
                self.ret_val = value;
                if self.stack.is_empty() {
                    self.finish();
                    Ok(RawStep::Done)
                } else {
                    if let Some(cb) = &self.callbacks.on_frame_done {
                        cb();
                    }
                    Ok(RawStep::PoppedFrame)
                }
            }
            Ok(Resumption::Suspended(susp)) => {
                frame.line = susp.line as i32;
                if let Some(name) = &susp.name {
                    frame.name = name.clone();
                }
                if let Some(scope) = &susp.scope {
                    frame.scope = scope.clone();
                }
                trace!("suspended at line {} in {}", susp.line, frame.name);
                Ok(RawStep::Suspended(susp))
            }
        }
    }

    /// Run-to-completion driving loop. Descends into every steppable
    /// invocation, pauses on breakpoints at statement boundaries, and
    /// reports when the stack shrinks below `min_depth`.
    fn drive(&mut self, min_depth: usize) -> Result<DriveStop, RuntimeError> {
        loop {
            match self._step()? {
                RawStep::Done => return Ok(DriveStop::Completed),
                RawStep::PoppedFrame => {
                    if self.stack.len() < min_depth {
                        return Ok(DriveStop::FrameReturned);
                    }
                }
                RawStep::Suspended(susp) => match susp.invocation {
                    Some(Invocation::Completed(value)) => self.ret_val = value,
                    Some(Invocation::Activation(activation)) => self.push_frame(*activation),
                    None => {
                        if self.should_pause(&susp) {
                            self.pause();
                            return Ok(DriveStop::Breakpoint);
                        }
                    }
                },
            }
        }
    }

    /// The one extra internal advance a `step_again` suspension asks for,
    /// so the visible stop lands on the caller's next statement boundary.
    /// An invocation met here is dispatched like any other; it cannot carry
    /// `step_again` itself, so this never chains.
    fn advance_extra(&mut self) -> Result<(), RuntimeError> {
        match self._step()? {
            RawStep::Done | RawStep::PoppedFrame => Ok(()),
            RawStep::Suspended(susp) => {
                match susp.invocation {
                    Some(Invocation::Completed(value)) => self.ret_val = value,
                    Some(Invocation::Activation(activation)) => {
                        let depth = self.stack.len();
                        self.push_frame(*activation);
                        self.drive(depth + 1)?;
                    }
                    None => {}
                }
                Ok(())
            }
        }
    }

    fn push_frame(&mut self, activation: Activation) {
        let name = activation.function_name().to_string();
        let scope = activation.own_scope();
        self.stack.push(StackFrame {
            activation,
            name,
            line: -1,
            scope,
        });
    }

    fn should_pause(&self, susp: &Suspension) -> bool {
        let breakpoints = self.breakpoints.borrow();
        breakpoints.is_enabled() && (susp.breakpoint || breakpoints.has(susp.line))
    }

    fn pause(&mut self) {
        if self.state == PauseState::Stopped {
            return;
        }
        self.state = PauseState::Paused;
        if let Some(cb) = &self.callbacks.on_break {
            cb();
        }
    }

    fn pause_if_running(&mut self) {
        if self.state == PauseState::Running {
            self.pause();
        }
    }

    fn finish(&mut self) {
        if self.state != PauseState::Stopped {
            self.state = PauseState::Stopped;
            trace!("program complete");
            if let Some(cb) = &self.callbacks.on_done {
                cb();
            }
        }
    }
}
