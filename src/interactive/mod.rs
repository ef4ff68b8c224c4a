//! Interactive front-end
//!
//! Editor-style commands driven through an injected [`Workbench`], with
//! persisted flags behind a [`KeyValueStore`].

pub mod commands;
pub mod store;
pub mod terminal;
pub mod workbench;

pub use commands::{CommandOutcome, InteractiveEnhancer, WELCOME_KEY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use terminal::{spawn_interrupt_handler, Document, TerminalProgress, TerminalWorkbench};
pub use workbench::{disposition_choices, Disposition, DispositionChoice, Workbench};
