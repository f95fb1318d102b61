//! The ladder service.
//!
//! Provides:
//! - Command parsing and processing, with a commit after every command
//! - Durable snapshots and the single-writer lock
//! - The serialized state loop and process wiring

pub mod calendar;
pub mod command;
pub mod processor;
pub mod run;
pub mod server;
pub mod snapshot;
pub mod store_lock;

pub use calendar::{Calendar, FixedCalendar, SystemCalendar};
pub use command::{Command, CommandKind, Parsed};
pub use processor::{COMMIT_FAILED, Inbound, LadderSettings, Processor, Reply, standings_lines};
pub use run::{run_bot, run_console};
pub use server::run_state_loop;
pub use snapshot::{SnapshotError, SnapshotSink, SnapshotStore};
pub use store_lock::{StoreLock, StoreLockError, StoreLockMeta};
