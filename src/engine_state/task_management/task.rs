//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the main thread with mutable access to
//!    the owner's state (by default the [`WorldState`])
//! 5. The result can schedule follow-up tasks
//!
//! If `process()` panics, the worker catches the panic and delivers `abandon()` instead,
//! so the main thread always hears back about every task it published.

use crate::engine_state::WorldState;

/// A unit of work executed on a worker thread.
///
/// Tasks own everything they need: shared data is reached through cloned handles,
/// never through borrows of main-thread state.
pub trait Task<C = WorldState>: Send {
    /// Performs the work. Runs on a worker thread.
    ///
    /// Errors are handled inside the task and reported through the returned result.
    fn process(&self) -> Box<dyn TaskResult<C> + Send>;

    /// The result delivered in place of `process()` when it panics.
    fn abandon(&self) -> Box<dyn TaskResult<C> + Send> {
        Box::new(NoopTaskResult)
    }
}

/// The outcome of a [`Task`], applied on the main thread.
pub trait TaskResult<C = WorldState>: Send {
    /// Applies the result to `context` and returns follow-up tasks (possibly none).
    ///
    /// Runs on the main thread between frames; keep it short.
    fn handle_result(self: Box<Self>, context: &mut C) -> Vec<Box<dyn Task<C> + Send>>;
}

/// A result with no effect.
pub struct NoopTaskResult;

impl<C> TaskResult<C> for NoopTaskResult {
    fn handle_result(self: Box<Self>, _context: &mut C) -> Vec<Box<dyn Task<C> + Send>> {
        Vec::new()
    }
}
