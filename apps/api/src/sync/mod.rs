// Host ↔ artboard synchronization: wire schema, the builder-side push state
// machine, and the artboard surface with its view controls and font gate.

pub mod artboard;
pub mod host;
pub mod messages;

pub use artboard::Artboard;
pub use host::{PreviewHost, SyncPhase};
pub use messages::{ArtboardMessage, Envelope};
