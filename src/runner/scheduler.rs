//! Task registry for steppers.
//!
//! Several independently created steppers can be registered at once (the
//! main program plus any queued function tasks); the current task is the
//! oldest one that has not finished. The registry is bookkeeping only; it
//! never drives a stepper itself.

use std::cell::RefCell;
use std::rc::Rc;

use super::stepper::Stepper;

pub type SharedStepper = Rc<RefCell<Stepper>>;

pub struct Scheduler {
    tasks: Vec<SharedStepper>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler { tasks: vec![] }
    }

    pub fn add_task(&mut self, stepper: SharedStepper) {
        self.tasks.push(stepper);
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// The oldest registered stepper that has not stopped.
    pub fn current_task(&self) -> Option<SharedStepper> {
        self.tasks
            .iter()
            .find(|t| !t.borrow().stopped())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}
