// Editing layer: the open-document session with its undo/redo history, and
// the debounced autosave controller that persists it.

pub mod autosave;
pub mod history;
pub mod session;

pub use autosave::{AutoSave, SaveOutcome};
pub use history::History;
pub use session::EditorSession;
