// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod store;

pub use engine::{Engine, GameState, TriggerOutcome, Verdict};
pub use history::{Attempt, History, HistoryLedger};
