//! Recipe model
//!
//! A recipe is an ordered list of [`StepDefinition`]s. A
//! [`RecipeTemplate`] is the unbound recipe; stamping it for a concrete
//! item yields a [`CookingTask`] that owns the item and a queue of
//! [`ActiveStep`]s, only the first of which has a running clock.

pub mod patty;
pub mod step;
pub mod task;
pub mod template;

pub use step::{always_done, never_done, ActiveStep, CompletionReason, StepDefinition, StepOutcome};
pub use task::{CookingTask, Ingredient, ItemId};
pub use template::RecipeTemplate;
