//! Trampoline scheduler
//!
//! Runs continuation-passing work without growing the host call stack.
//! Continuations never call each other; they schedule each other on an
//! [`Agenda`]:
//!
//! - [`Agenda::add_work`] appends to a FIFO work queue and returns a
//!   [`WorkId`] whose result can be read later.
//! - [`Agenda::add_tail`] pushes onto a LIFO tail stack. The tail is linked to
//!   the continuation that registered it; when it finishes, its result is
//!   handed up the chain of links to the work item that started the chain.
//!
//! The work queue is always drained completely before the next tail is
//! popped, so a tail registered next to some `add_work` calls runs only after
//! that work and everything it scheduled in turn has finished.
//!
//! # Example
//!
//! ```rust
//! use tramlex::parser::trampoline::{Agenda, CancellationToken, Trampoline};
//!
//! // Sum 1..=n by scheduling one work item per number
//! fn sum(n: u64) -> impl FnOnce(&mut u64, &mut Agenda<u64, u64, ()>) -> Result<Option<u64>, ()> {
//!     move |total, agenda| {
//!         *total += n;
//!         if n > 1 {
//!             agenda.add_work(sum(n - 1));
//!         }
//!         Ok(Some(*total))
//!     }
//! }
//!
//! let mut total = 0;
//! let result = Trampoline::new()
//!     .execute(sum(100_000), &mut total, &CancellationToken::new())
//!     .unwrap();
//! assert_eq!(result, Some(100_000));
//! assert_eq!(total, 5_000_050_000);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Default step limit (0 = unlimited)
pub const DEFAULT_MAX_STEPS: usize = 0;

/// Default timeout in milliseconds (0 = no timeout)
pub const DEFAULT_TIMEOUT_MS: u64 = 0;

/// Number of dispatches between two timeout checks
const TIMEOUT_CHECK_INTERVAL: usize = 1000;

/// A scheduled continuation
///
/// Receives the execution context and the agenda to schedule more work on.
/// Returns the produced value, if any, or a fault that aborts the execution.
pub type Continuation<C, T, E> =
    Box<dyn FnOnce(&mut C, &mut Agenda<C, T, E>) -> Result<Option<T>, E>>;

/// Handle of a scheduled work item or tail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkId(usize);

/// Cooperative cancellation flag, shareable across threads
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why an execution ended without a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError<E> {
    /// The cancellation token was set
    Cancelled,
    /// More than `max_steps` continuations were dispatched
    StepLimitExceeded {
        /// Configured limit
        max_steps: usize,
    },
    /// The execution ran longer than the configured timeout
    TimeoutExceeded {
        /// Time elapsed in milliseconds
        elapsed_ms: u64,
        /// Timeout limit in milliseconds
        timeout_ms: u64,
    },
    /// A continuation returned an error
    Fault(E),
}

impl<E: fmt::Display> fmt::Display for ExecuteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Cancelled => write!(f, "Execution was cancelled"),
            ExecuteError::StepLimitExceeded { max_steps } => {
                write!(f, "Execution exceeded the limit of {} steps", max_steps)
            }
            ExecuteError::TimeoutExceeded {
                elapsed_ms,
                timeout_ms,
            } => write!(
                f,
                "Execution timed out after {} ms (limit {} ms)",
                elapsed_ms, timeout_ms
            ),
            ExecuteError::Fault(e) => write!(f, "{}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ExecuteError<E> {}

/// Limits applied by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of dispatched continuations (0 = unlimited)
    pub max_steps: usize,
    /// Timeout in milliseconds (0 = no timeout)
    pub timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SchedulerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step limit
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

struct Slot<C, T, E> {
    continuation: Option<Continuation<C, T, E>>,
    result: Option<T>,
    /// Work item that started the chain of tails this slot belongs to
    origin: WorkId,
}

/// Pending work of one execution
pub struct Agenda<C, T, E> {
    slots: Vec<Slot<C, T, E>>,
    work: VecDeque<WorkId>,
    tails: Vec<WorkId>,
    current: Option<WorkId>,
}

impl<C, T, E> Agenda<C, T, E> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            work: VecDeque::new(),
            tails: Vec::new(),
            current: None,
        }
    }

    fn push_slot(&mut self, continuation: Continuation<C, T, E>, parent: Option<WorkId>) -> WorkId {
        let id = WorkId(self.slots.len());
        let origin = parent.map_or(id, |p| self.slots[p.0].origin);
        self.slots.push(Slot {
            continuation: Some(continuation),
            result: None,
            origin,
        });
        id
    }

    /// Schedule `f` at the back of the work queue
    pub fn add_work<F>(&mut self, f: F) -> WorkId
    where
        F: FnOnce(&mut C, &mut Agenda<C, T, E>) -> Result<Option<T>, E> + 'static,
    {
        let id = self.push_slot(Box::new(f), None);
        self.work.push_back(id);
        id
    }

    /// Schedule `f` on top of the tail stack, linked to the running continuation
    pub fn add_tail<F>(&mut self, f: F) -> WorkId
    where
        F: FnOnce(&mut C, &mut Agenda<C, T, E>) -> Result<Option<T>, E> + 'static,
    {
        let parent = self.current;
        let id = self.push_slot(Box::new(f), parent);
        self.tails.push(id);
        id
    }

    /// Result currently recorded for `id`
    pub fn result(&self, id: WorkId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.result.as_ref())
    }

    /// Move the result recorded for `id` out of the agenda
    pub fn take_result(&mut self, id: WorkId) -> Option<T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.result.take())
    }

    /// Number of scheduled continuations that have not run yet
    pub fn pending(&self) -> usize {
        self.work.len() + self.tails.len()
    }

    /// Handle of the continuation being run
    pub fn current(&self) -> Option<WorkId> {
        self.current
    }

    fn next(&mut self) -> Option<(WorkId, bool)> {
        if let Some(id) = self.work.pop_front() {
            return Some((id, false));
        }
        self.tails.pop().map(|id| (id, true))
    }

    /// Hand a finished tail's result to the start of its chain
    ///
    /// Every link between the tail and the chain start is itself a finished
    /// tail whose result is never read, so only the chain start records it.
    fn propagate(&mut self, id: WorkId, value: Option<T>) {
        let origin = self.slots[id.0].origin;
        self.slots[origin.0].result = value;
    }

    fn clear(&mut self) {
        self.work.clear();
        self.tails.clear();
        self.slots.clear();
        self.current = None;
    }
}

/// Executes continuation-passing work in a loop
#[derive(Debug, Clone, Default)]
pub struct Trampoline {
    config: SchedulerConfig,
}

impl Trampoline {
    /// Create a scheduler without limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with the given limits
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The scheduler limits
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run `initial` and everything it schedules, returning its final result
    ///
    /// Continuations run one at a time on the calling thread. Cancellation
    /// and the configured limits are checked before every dispatch. On
    /// cancellation, an exceeded limit or a fault, all pending work is
    /// dropped and the error is returned; no partial result is produced.
    pub fn execute<C, T, E, F>(
        &self,
        initial: F,
        ctx: &mut C,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ExecuteError<E>>
    where
        F: FnOnce(&mut C, &mut Agenda<C, T, E>) -> Result<Option<T>, E> + 'static,
    {
        let mut agenda = Agenda::new();
        let root = agenda.add_work(initial);
        let start = Instant::now();
        let mut steps = 0usize;

        log_debug!("Trampoline started");

        loop {
            if cancel.is_cancelled() {
                agenda.clear();
                log_debug!("Trampoline cancelled after {} steps", steps);
                return Err(ExecuteError::Cancelled);
            }

            let Some((id, is_tail)) = agenda.next() else {
                break;
            };

            steps += 1;
            if self.config.max_steps > 0 && steps > self.config.max_steps {
                agenda.clear();
                return Err(ExecuteError::StepLimitExceeded {
                    max_steps: self.config.max_steps,
                });
            }
            if self.config.timeout_ms > 0 && steps % TIMEOUT_CHECK_INTERVAL == 0 {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                if elapsed_ms > self.config.timeout_ms {
                    agenda.clear();
                    return Err(ExecuteError::TimeoutExceeded {
                        elapsed_ms,
                        timeout_ms: self.config.timeout_ms,
                    });
                }
            }

            let Some(continuation) = agenda.slots[id.0].continuation.take() else {
                continue;
            };

            agenda.current = Some(id);
            let outcome = continuation(ctx, &mut agenda);
            agenda.current = None;

            match outcome {
                Ok(value) if is_tail => agenda.propagate(id, value),
                Ok(value) => agenda.slots[id.0].result = value,
                Err(fault) => {
                    agenda.clear();
                    log_debug!("Trampoline aborted after {} steps", steps);
                    return Err(ExecuteError::Fault(fault));
                }
            }
        }

        log_debug!("Trampoline finished after {} steps", steps);
        Ok(agenda.take_result(root))
    }
}
