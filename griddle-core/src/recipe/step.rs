//! Step definitions and their running instances

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::task::ItemId;

type Action<I, C> = Box<dyn Fn(&mut I, &mut C)>;
type Predicate<I, C> = Box<dyn Fn(&mut I, &mut C) -> bool>;

/// One named stage of a recipe
///
/// The action runs once, when the step completes. The completion predicate
/// is polled on every tick until it returns true or the step has run for
/// `max_duration`, whichever comes first. Both callables receive the item
/// being cooked and the station context; the predicate may update the item
/// (e.g. record the last temperature reading).
///
/// Definitions are immutable and shared by every task stamped from the
/// same template.
pub struct StepDefinition<I, C> {
    name: String,
    action: Action<I, C>,
    is_complete: Predicate<I, C>,
    max_duration: Duration,
}

impl<I, C> StepDefinition<I, C> {
    /// Create a new step definition
    pub fn new(
        name: impl Into<String>,
        max_duration: Duration,
        action: impl Fn(&mut I, &mut C) + 'static,
        is_complete: impl Fn(&mut I, &mut C) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            is_complete: Box::new(is_complete),
            max_duration,
        }
    }

    /// Step name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Longest the step may wait for its predicate
    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Run the step's action
    pub fn run_action(&self, item: &mut I, ctx: &mut C) {
        (self.action)(item, ctx)
    }

    /// Poll the completion predicate
    pub fn is_complete(&self, item: &mut I, ctx: &mut C) -> bool {
        (self.is_complete)(item, ctx)
    }
}

impl<I, C> fmt::Debug for StepDefinition<I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("max_duration", &self.max_duration)
            .finish_non_exhaustive()
    }
}

/// Predicate that never reports completion; the step ends on its deadline
pub fn never_done<I, C>(_item: &mut I, _ctx: &mut C) -> bool {
    false
}

/// Predicate that completes on the first tick
pub fn always_done<I, C>(_item: &mut I, _ctx: &mut C) -> bool {
    true
}

/// A step definition bound to one cooking task
///
/// The start time is unset until the step reaches the head of its task's
/// queue.
pub struct ActiveStep<I, C> {
    definition: Rc<StepDefinition<I, C>>,
    started_at: Option<Duration>,
}

impl<I, C> ActiveStep<I, C> {
    /// Bind a definition, clock not yet running
    pub fn new(definition: Rc<StepDefinition<I, C>>) -> Self {
        Self {
            definition,
            started_at: None,
        }
    }

    /// Shared definition
    pub fn definition(&self) -> &Rc<StepDefinition<I, C>> {
        &self.definition
    }

    /// Start the step clock
    pub fn start(&mut self, now: Duration) {
        self.started_at = Some(now);
    }

    /// Check whether the step clock is running
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since the step started; zero if it has not started
    pub fn elapsed(&self, now: Duration) -> Duration {
        self.started_at
            .map(|start| now.saturating_sub(start))
            .unwrap_or_default()
    }

    /// Check whether the step has used up its time budget
    pub fn is_expired(&self, now: Duration) -> bool {
        self.is_running() && self.elapsed(now) >= self.definition.max_duration()
    }
}

impl<I, C> fmt::Debug for ActiveStep<I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveStep")
            .field("name", &self.definition.name())
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Why a step completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The completion predicate returned true
    ConditionMet,
    /// The step ran for its maximum duration
    MaxTimeExceeded,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::ConditionMet => f.write_str("condition met"),
            CompletionReason::MaxTimeExceeded => f.write_str("max time exceeded"),
        }
    }
}

/// A step that just completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Definition name of the completed step
    pub step: String,
    /// Item the step ran for
    pub item: ItemId,
    /// Why it completed
    pub reason: CompletionReason,
}

impl StepOutcome {
    /// Name used in diagnostics, e.g. `flip:3`
    pub fn display_name(&self) -> String {
        format!("{}:{}", self.step, self.item)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.step, self.item, self.reason)
    }
}
