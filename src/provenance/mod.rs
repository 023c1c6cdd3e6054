//! Line provenance: which rendered rows of every stage panel were derived
//! from which source lines, and the hover protocol that keeps panels in sync.

pub mod detail;
pub mod error;
pub mod line_index;
pub mod panel;
pub mod pipeline;
pub mod sync;

pub use detail::{Detail, SourceLine};
pub use error::{InvalidRange, StageTransformError};
pub use line_index::LineIndex;
pub use panel::{PanelId, SharedPanel, StagePanel, Viewport};
pub use pipeline::{Generation, PipelineReport, PipelineRunner, Stage, StageOutcome};
pub use sync::{BroadcastReport, HoverOutcome, SyncController, SyncState};
