//! # Task Management System
//!
//! A fixed pool of worker threads executing [`Task`]s off the main thread.
//!
//! ## Architecture Overview
//! - `TaskManager`: owns the workers, distributes tasks and collects results
//! - `TaskChannel`: the pair of channels connecting the main thread to one worker
//! - `Task` / `TaskResult`: see [`task`]
//!
//! Each worker has a dedicated channel and at most [`MAX_TASKS_IN_FLIGHT`] tasks
//! assigned; further tasks wait in a FIFO queue on the main thread. Tasks are handed out
//! round-robin.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager sends them to an idle worker, or queues them
//! 3. Workers process tasks and send back results
//! 4. The main thread polls results in `process_completed_tasks()` without blocking
//! 5. Results may publish follow-up tasks
//!
//! `wait_for_all()` is the only blocking call; it is meant for world initialization and
//! tests.
//!
//! ## Example Usage
//! ```
//! use voxel_world::engine_state::task_management::TaskManager;
//! use voxel_world::engine_state::task_management::task::{Task, TaskResult};
//!
//! struct Square(u64);
//! struct Squared(u64);
//!
//! impl Task<Vec<u64>> for Square {
//!     fn process(&self) -> Box<dyn TaskResult<Vec<u64>> + Send> {
//!         Box::new(Squared(self.0 * self.0))
//!     }
//! }
//!
//! impl TaskResult<Vec<u64>> for Squared {
//!     fn handle_result(self: Box<Self>, out: &mut Vec<u64>) -> Vec<Box<dyn Task<Vec<u64>> + Send>> {
//!         out.push(self.0);
//!         Vec::new()
//!     }
//! }
//!
//! let mut manager: TaskManager<Vec<u64>> = TaskManager::new(2).unwrap();
//! manager.publish_task(Box::new(Square(3)));
//! let mut out = Vec::new();
//! manager.wait_for_all(&mut out);
//! assert_eq!(out, vec![9]);
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::Context;
use log::{debug, error, warn};
use task::{Task, TaskResult};

use super::WorldState;

/// A communication channel between the main thread and a worker thread.
///
/// - `task_sender`: sends tasks from main thread to worker
/// - `result_receiver`: receives task results from worker
/// - `num_tasks_in_flight`: tasks sent but not yet answered
pub struct TaskChannel<C: 'static = WorldState> {
    task_sender: Sender<Box<dyn Task<C> + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult<C> + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager closes every channel and joins the workers; tasks already
/// running finish first.
pub struct TaskManager<C: 'static = WorldState> {
    channels: Vec<TaskChannel<C>>,
    queued_tasks: VecDeque<Box<dyn Task<C> + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl<C: 'static> TaskManager<C> {
    /// Creates a `TaskManager` with `num_workers` worker threads.
    ///
    /// # Errors
    /// Fails if a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> anyhow::Result<Self> {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task<C> + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult<C> + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
                        Ok(result) => result,
                        Err(payload) => {
                            error!(
                                "Task panicked on worker {}: {}",
                                index,
                                panic_message(payload.as_ref())
                            );
                            task.abandon()
                        }
                    };
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("world-worker-{index}"))
                .spawn(task_closure)
                .with_context(|| format!("Failed to spawn worker thread {index}"))?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        debug!("Started {} worker threads", num_workers);

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task back if the worker has disconnected.
    fn try_send_task(
        &mut self,
        task: Box<dyn Task<C> + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task<C> + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an idle worker channel, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel % self.channels.len();
        let mut current = start_channel;
        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a task for execution.
    ///
    /// # Returns
    /// - `true` if the task was sent to a worker immediately
    /// - `false` if it was queued because every worker is busy
    pub fn publish_task(&mut self, task: Box<dyn Task<C> + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    warn!("Worker {} disconnected; queueing task", channel_idx);
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Sends queued tasks to idle workers, oldest first.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Applies every result that has arrived, without blocking.
    ///
    /// Follow-up tasks returned by the results are published afterwards.
    ///
    /// # Returns
    /// The number of results handled.
    pub fn process_completed_tasks(&mut self, context: &mut C) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                handled += 1;
                tasks_to_queue.extend(result.handle_result(context));
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        self.process_queued_tasks();
        handled
    }

    /// Blocks until every published task, and every task they publish in turn, has
    /// completed and been handled.
    pub fn wait_for_all(&mut self, context: &mut C) {
        loop {
            self.process_queued_tasks();

            let Some(channel_idx) = self
                .channels
                .iter()
                .position(|channel| channel.num_tasks_in_flight > 0)
            else {
                if !self.queued_tasks.is_empty() {
                    warn!(
                        "{} tasks queued with no worker able to take them",
                        self.queued_tasks.len()
                    );
                }
                break;
            };

            match self.channels[channel_idx].result_receiver.recv() {
                Ok(result) => {
                    self.channels[channel_idx].num_tasks_in_flight -= 1;
                    for task in result.handle_result(context) {
                        self.publish_task(task);
                    }
                }
                Err(_) => {
                    error!("Worker {} disconnected with tasks in flight", channel_idx);
                    self.channels[channel_idx].num_tasks_in_flight = 0;
                }
            }
        }
    }

    /// Tasks sent to workers and not yet handled.
    pub fn in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether any task is queued or in flight.
    pub fn tasks_pending(&self) -> bool {
        !self.queued_tasks.is_empty() || self.in_flight() > 0
    }
}

impl<C: 'static> Drop for TaskManager<C> {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        for (index, channel) in self.channels.drain(..).enumerate() {
            let TaskChannel {
                task_sender,
                result_receiver,
                worker,
                ..
            } = channel;
            drop(task_sender);
            drop(result_receiver);
            if worker.join().is_err() {
                error!("Worker {} exited with a panic", index);
            }
        }
    }
}
