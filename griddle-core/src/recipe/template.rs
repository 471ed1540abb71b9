//! Recipe templates

use std::rc::Rc;

use super::step::StepDefinition;

/// An unbound recipe: a non-empty, ordered list of step definitions
///
/// Tasks stamped from a template share its definitions, so the template
/// can be dropped at shutdown independently of any task.
pub struct RecipeTemplate<I, C> {
    name: String,
    steps: Vec<Rc<StepDefinition<I, C>>>,
}

impl<I, C> RecipeTemplate<I, C> {
    /// Start a template with its first step
    pub fn new(name: impl Into<String>, first: StepDefinition<I, C>) -> Self {
        Self {
            name: name.into(),
            steps: vec![Rc::new(first)],
        }
    }

    /// Append a step
    pub fn then(mut self, step: StepDefinition<I, C>) -> Self {
        self.steps.push(Rc::new(step));
        self
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step definitions in execution order
    pub fn steps(&self) -> &[Rc<StepDefinition<I, C>>] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a template has at least one step
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<I, C> std::fmt::Debug for RecipeTemplate<I, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeTemplate")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .finish()
    }
}
