//! reelcut_core: the timeline engine behind reelcut.
//!
//! Owns the arrangement of clips across tracks, enforces non-overlap and
//! duration invariants, and makes every mutation reversible through a
//! bounded undo/redo history. Rendering, decoding, and all UI concerns live
//! elsewhere; the presentation layer reads this crate's state and calls its
//! operations.

pub mod editing;
pub mod error;
pub mod history;
pub mod keyframes;
pub mod media;
pub mod placement;
pub mod project;
pub mod snapping;
pub mod timeline;
pub mod types;

pub use editing::TrimEdge;
pub use error::{CoreError, Result};
pub use history::{Command, History, HistoryEntry};
pub use media::MediaCatalog;
pub use project::Project;
pub use timeline::Timeline;
pub use types::*;
