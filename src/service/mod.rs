//! Service layer: the polling state machine and the command interpreter.
//!
//! [`PollScheduler`] fetches every followed game on an interval, lets the
//! [`TransitionEngine`] decide what changed and delivers the result through
//! a [`crate::gateway::ChatGateway`]. [`CommandInterpreter`] turns inbound
//! chat text into subscription changes.

pub mod commands;
pub mod scheduler;
pub mod transition;

pub use commands::CommandInterpreter;
pub use scheduler::{CycleReport, PollScheduler};
pub use transition::{Transition, TransitionEngine};
