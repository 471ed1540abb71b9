//! Registry of live cooking tasks

use std::fmt;

use tracing::{debug, info, trace};

use crate::recipe::{CookingTask, Ingredient, RecipeTemplate, StepOutcome};
use crate::traits::Clock;

/// All cooking tasks in flight, in insertion order
///
/// Only the control thread touches the registry. Tasks are advanced by
/// [`tick_all`](Self::tick_all) and removed by
/// [`reap_done`](Self::reap_done); nothing else changes task state.
pub struct TaskRegistry<I, C> {
    tasks: Vec<CookingTask<I, C>>,
}

impl<I, C> Default for TaskRegistry<I, C> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<I: Ingredient, C> TaskRegistry<I, C> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the template once per detected item and append the tasks
    ///
    /// Returns the number of tasks added. Duplicate detections are not
    /// filtered; each becomes its own task.
    pub fn build_from_detections(
        &mut self,
        template: &RecipeTemplate<I, C>,
        items: impl IntoIterator<Item = I>,
        clock: &dyn Clock,
    ) -> usize {
        let before = self.tasks.len();
        self.tasks.extend(
            items
                .into_iter()
                .map(|item| CookingTask::stamp_from(template, item, clock)),
        );
        let added = self.tasks.len() - before;
        info!("Scheduled {} items with recipe '{}'", added, template.name());
        added
    }

    /// Give every task one chance to advance, in insertion order
    ///
    /// Each task completes at most one step per tick. Returns the steps
    /// that completed.
    pub fn tick_all(&mut self, ctx: &mut C, clock: &dyn Clock) -> Vec<StepOutcome> {
        let mut completed = Vec::new();
        for (index, task) in self.tasks.iter_mut().enumerate() {
            if let Some(outcome) = task.try_advance(ctx, clock) {
                info!(
                    "Task {}: step {} finished ({})",
                    index,
                    outcome.display_name(),
                    outcome.reason
                );
                completed.push(outcome);
            }
        }
        completed
    }

    /// Drop every finished task together with its item
    ///
    /// Live tasks keep their relative order. Returns the number removed.
    pub fn reap_done(&mut self) -> usize {
        let (done, live): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.is_done());
        self.tasks = live;

        let reaped = done.len();
        for task in done {
            let item = task.into_item();
            trace!("Released item {}", item.id());
        }
        if reaped > 0 {
            debug!("Reaped {} finished tasks, {} remaining", reaped, self.tasks.len());
        }
        reaped
    }
}

impl<I, C> TaskRegistry<I, C> {
    /// Number of tasks, finished or not
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no task remains
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CookingTask<I, C>> {
        self.tasks.iter()
    }
}

impl<I: fmt::Debug, C> fmt::Debug for TaskRegistry<I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tasks.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{always_done, never_done, CompletionReason, ItemId, StepDefinition};
    use crate::traits::ManualClock;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Item that counts how many times it has been dropped
    #[derive(Debug)]
    struct Counted {
        id: ItemId,
        drops: Rc<Cell<usize>>,
    }

    impl Counted {
        fn new(drops: &Rc<Cell<usize>>) -> Self {
            Self {
                id: ItemId::next(),
                drops: Rc::clone(drops),
            }
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    impl Ingredient for Counted {
        fn id(&self) -> ItemId {
            self.id
        }
    }

    /// Context recording which actions ran
    #[derive(Default)]
    struct Log {
        actions: Vec<(String, ItemId)>,
    }

    fn timed(first: Duration, second: Duration) -> RecipeTemplate<Counted, Log> {
        RecipeTemplate::new(
            "timed",
            StepDefinition::new(
                "flip",
                first,
                |item: &mut Counted, log: &mut Log| log.actions.push(("flip".into(), item.id)),
                never_done,
            ),
        )
        .then(StepDefinition::new(
            "remove",
            second,
            |item: &mut Counted, log: &mut Log| log.actions.push(("remove".into(), item.id)),
            never_done,
        ))
    }

    #[test]
    fn test_timed_recipe_fires_on_deadlines() {
        let drops = Rc::new(Cell::new(0));
        let clock = ManualClock::new();
        let template = timed(Duration::from_secs(60), Duration::from_secs(5));
        let mut registry = TaskRegistry::new();
        let mut log = Log::default();

        registry.build_from_detections(&template, [Counted::new(&drops)], &clock);

        for second in 0..=70u64 {
            clock.set(Duration::from_secs(second));
            let outcomes = registry.tick_all(&mut log, &clock);
            match second {
                60 => {
                    assert_eq!(outcomes.len(), 1);
                    assert_eq!(outcomes[0].step, "flip");
                    assert_eq!(outcomes[0].reason, CompletionReason::MaxTimeExceeded);
                }
                65 => {
                    assert_eq!(outcomes.len(), 1);
                    assert_eq!(outcomes[0].step, "remove");
                }
                _ => assert!(outcomes.is_empty(), "unexpected completion at {}s", second),
            }
            registry.reap_done();
        }

        assert!(registry.is_empty());
        assert_eq!(log.actions.len(), 2);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_build_from_detections() {
        let drops = Rc::new(Cell::new(0));
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(12));
        let template = timed(Duration::from_secs(60), Duration::from_secs(5));
        let mut registry = TaskRegistry::new();

        let added = registry.build_from_detections(
            &template,
            (0..3).map(|_| Counted::new(&drops)),
            &clock,
        );

        assert_eq!(added, 3);
        assert_eq!(registry.len(), 3);
        for task in registry.iter() {
            let head = task.head().unwrap();
            assert!(head.is_running());
            assert_eq!(head.elapsed(Duration::from_secs(12)), Duration::ZERO);
        }
        // Definitions are shared, not copied
        assert_eq!(Rc::strong_count(&template.steps()[0]), 4);
    }

    #[test]
    fn test_empty_detections_add_nothing() {
        let clock = ManualClock::new();
        let template = timed(Duration::from_secs(1), Duration::from_secs(1));
        let mut registry: TaskRegistry<Counted, Log> = TaskRegistry::new();

        assert_eq!(registry.build_from_detections(&template, [], &clock), 0);
        assert!(registry.tick_all(&mut Log::default(), &clock).is_empty());
        assert_eq!(registry.reap_done(), 0);
    }

    #[test]
    fn test_tick_order_follows_insertion() {
        let drops = Rc::new(Cell::new(0));
        let clock = ManualClock::new();
        let template: RecipeTemplate<Counted, Log> = RecipeTemplate::new(
            "instant",
            StepDefinition::new(
                "go",
                Duration::from_secs(60),
                |item: &mut Counted, log: &mut Log| log.actions.push(("go".into(), item.id)),
                always_done,
            ),
        );
        let mut registry = TaskRegistry::new();
        let items: Vec<_> = (0..4).map(|_| Counted::new(&drops)).collect();
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        registry.build_from_detections(&template, items, &clock);

        let mut log = Log::default();
        let outcomes = registry.tick_all(&mut log, &clock);

        let fired: Vec<_> = log.actions.iter().map(|(_, id)| *id).collect();
        assert_eq!(fired, ids);
        assert_eq!(outcomes.iter().map(|o| o.item).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_reap_drops_done_items_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        let clock = ManualClock::new();
        let quick = timed(Duration::ZERO, Duration::ZERO);
        let slow = timed(Duration::from_secs(60), Duration::from_secs(60));
        let mut registry = TaskRegistry::new();
        let mut log = Log::default();

        registry.build_from_detections(&quick, [Counted::new(&drops)], &clock);
        registry.build_from_detections(&slow, [Counted::new(&drops)], &clock);
        registry.build_from_detections(&quick, [Counted::new(&drops)], &clock);
        let survivor = registry.iter().nth(1).unwrap().item().id;

        // Two ticks finish both steps of the quick tasks
        registry.tick_all(&mut log, &clock);
        registry.tick_all(&mut log, &clock);
        assert_eq!(drops.get(), 0);

        assert_eq!(registry.reap_done(), 2);
        assert_eq!(drops.get(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.iter().next().unwrap().item().id, survivor);

        // Reaping again releases nothing more
        assert_eq!(registry.reap_done(), 0);
        assert_eq!(drops.get(), 2);

        drop(registry);
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn test_reap_keeps_live_order() {
        let drops = Rc::new(Cell::new(0));
        let clock = ManualClock::new();
        let quick = timed(Duration::ZERO, Duration::ZERO);
        let slow = timed(Duration::from_secs(60), Duration::from_secs(60));
        let mut registry = TaskRegistry::new();

        let mut expected = Vec::new();
        for n in 0..6 {
            let item = Counted::new(&drops);
            if n % 2 == 0 {
                expected.push(item.id);
                registry.build_from_detections(&slow, [item], &clock);
            } else {
                registry.build_from_detections(&quick, [item], &clock);
            }
        }

        let mut log = Log::default();
        registry.tick_all(&mut log, &clock);
        registry.tick_all(&mut log, &clock);
        registry.reap_done();

        let remaining: Vec<_> = registry.iter().map(|t| t.item().id).collect();
        assert_eq!(remaining, expected);
    }

    proptest! {
        #[test]
        fn prop_first_step_fires_at_first_tick_past_deadline(
            deadline_s in 0u64..120,
            tick_s in 1u64..10,
        ) {
            let drops = Rc::new(Cell::new(0));
            let clock = ManualClock::new();
            let template = timed(Duration::from_secs(deadline_s), Duration::from_secs(3600));
            let mut registry = TaskRegistry::new();
            let mut log = Log::default();
            registry.build_from_detections(&template, [Counted::new(&drops)], &clock);

            let mut now = 0;
            let fired_at = loop {
                clock.set(Duration::from_secs(now));
                if !registry.tick_all(&mut log, &clock).is_empty() {
                    break now;
                }
                now += tick_s;
            };

            prop_assert!(fired_at >= deadline_s);
            prop_assert!(fired_at < deadline_s + tick_s);
        }
    }
}
