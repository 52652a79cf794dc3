//! Remote backup for Pocket records.
//!
//! Defines the `RemoteCollaborator` contract, an HTTP implementation, an
//! in-memory implementation, and the cancellable full-replace routine that
//! overwrites the remote with local state.

pub mod cancel;
pub mod engine;
pub mod error;
pub mod http;
pub mod memory;
pub mod remote;

pub use cancel::CancelToken;
pub use engine::{SyncEngine, SyncReport};
pub use error::SyncError;
pub use http::HttpCollaborator;
pub use memory::{FailPoint, InMemoryRemote};
pub use remote::{RemoteCollaborator, RemotePayload, RemoteRecord};
