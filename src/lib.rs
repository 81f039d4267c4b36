pub mod client;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod identity;
pub mod operation;
pub mod session;

pub use client::{StorageClient, StorageClientBuilder, SwiftResponse};
pub use credentials::Credentials;
pub use error::StorageError;
pub use operation::Operation;
pub use session::{ConfigFileSessionStore, MemorySessionStore, Session, SessionStore};
