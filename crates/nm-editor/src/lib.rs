pub mod ideas;
pub mod input;
pub mod interaction;
pub mod measure;
pub mod sync;

pub use ideas::{Completion, GenerationError, IdeaConfig, IdeaFlow, TextGenerator, run_ideas, run_summary};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::{InteractionConfig, InteractionController, Mode, Outcome, Preview};
pub use measure::{MeasureConfig, MeasureQueue};
pub use sync::{BoardEngine, BoardMutation};
