//! Diff-driven synchronization of local workspace state to a remote store.
//!
//! Local state is authoritative; this crate only pushes. Mutations enqueue
//! idempotent row writes into an [`Outbox`], which coalesces them per stable
//! id and drains against a [`RemoteStore`]. Failures surface as a
//! per-schema [`SyncStatus`] badge and never roll back local edits.

#![deny(unsafe_code)]

pub mod outbox;
pub mod remote;
pub mod status;

pub use outbox::{Outbox, SyncOp, run_drain_loop};
pub use remote::{RemoteStore, Result, SyncError};
pub use status::SyncStatus;
