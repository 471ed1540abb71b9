//! Cooking tasks

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use super::step::{ActiveStep, CompletionReason, StepOutcome};
use super::template::RecipeTemplate;
use crate::traits::Clock;

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a cooked item
///
/// Used to name step attempts in diagnostics; two items never share an id
/// within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything a recipe can be applied to
pub trait Ingredient {
    /// Identity used in step display names
    fn id(&self) -> ItemId;
}

/// One item paired with the steps still to run on it
///
/// The task owns its item; when the task is dropped, so is the item. The
/// head step's clock is running, the others have not started.
pub struct CookingTask<I, C> {
    item: I,
    steps: VecDeque<ActiveStep<I, C>>,
}

impl<I: Ingredient, C> CookingTask<I, C> {
    /// Bind a template to an item and start the first step's clock
    pub fn stamp_from(template: &RecipeTemplate<I, C>, item: I, clock: &dyn Clock) -> Self {
        let mut steps: VecDeque<_> = template
            .steps()
            .iter()
            .map(|def| ActiveStep::new(Rc::clone(def)))
            .collect();

        if let Some(head) = steps.front_mut() {
            head.start(clock.now());
        }

        debug!(
            "Stamped '{}' for item {} ({} steps)",
            template.name(),
            item.id(),
            steps.len()
        );

        Self { item, steps }
    }

    /// Check the head step and complete it if it is due
    ///
    /// The head completes when it has run for its maximum duration or its
    /// predicate reports completion; the deadline is checked first and a
    /// step past its deadline completes without polling the predicate.
    /// Completing runs the step's action, removes the step and starts the
    /// next step's clock after the action has returned.
    ///
    /// Returns `None` if the task is done or the head step is not due.
    pub fn try_advance(&mut self, ctx: &mut C, clock: &dyn Clock) -> Option<StepOutcome> {
        let head = self.steps.front()?;
        let definition = Rc::clone(head.definition());

        let reason = if head.is_expired(clock.now()) {
            CompletionReason::MaxTimeExceeded
        } else if definition.is_complete(&mut self.item, ctx) {
            CompletionReason::ConditionMet
        } else {
            trace!("{}:{} not done yet", definition.name(), self.item.id());
            return None;
        };

        definition.run_action(&mut self.item, ctx);
        self.steps.pop_front();

        if let Some(next) = self.steps.front_mut() {
            next.start(clock.now());
        }

        Some(StepOutcome {
            step: definition.name().to_string(),
            item: self.item.id(),
            reason,
        })
    }
}

impl<I, C> CookingTask<I, C> {
    /// Check if every step has completed
    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }

    /// Item being cooked
    pub fn item(&self) -> &I {
        &self.item
    }

    /// Steps still to run, head first
    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }

    /// Name of the head step, if any
    pub fn current_step(&self) -> Option<&str> {
        self.steps.front().map(|s| s.definition().name())
    }

    /// Head step, if any
    pub fn head(&self) -> Option<&ActiveStep<I, C>> {
        self.steps.front()
    }

    /// Release the item
    pub fn into_item(self) -> I {
        self.item
    }
}

impl<I: fmt::Debug, C> fmt::Debug for CookingTask<I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookingTask")
            .field("item", &self.item)
            .field("steps", &self.steps)
            .finish()
    }
}
