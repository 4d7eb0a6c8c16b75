//! The Vibe Ripper pipeline.
//!
//! One selected media asset flows through encoding, schema-constrained
//! request building, a single backend exchange, and strict reply parsing.
//! A pure session state machine sequences primary analysis and the
//! DNA-locked variant expansion; successful analyses land in a bounded,
//! persisted history.

pub mod access;
pub mod encoder;
pub mod history;
pub mod parse;
pub mod preview;
pub mod request;
pub mod session;
pub mod state;
pub mod storage;

pub use access::AccessGate;
pub use encoder::{encode, load_asset};
pub use history::{HistoryEntry, HistoryStore, HISTORY_CAPACITY};
pub use parse::{parse, Parsed};
pub use preview::{NoPreview, PreviewHandle, PreviewLease, PreviewSurface, TempFilePreview};
pub use request::{DnaAnchors, RequestBuilder, RequestContext};
pub use session::{GenerationTask, Studio, TaskOutcome};
pub use state::{transition, Event, Guard, LoadedProfile, Rejection, SessionFault, SessionState};
pub use storage::{JsonFileStore, MemoryStore, Slot, StateStore};
