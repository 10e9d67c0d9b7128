pub mod activation;
pub mod breakpoints;
pub mod context;
pub mod debugger;
pub mod ds;
pub mod eval;
pub mod scheduler;
pub mod stepper;
