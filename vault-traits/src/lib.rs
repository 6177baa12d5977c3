//! # Host Bridge Traits
//!
//! Capability traits the catalog core requires from its host environment.
//!
//! ## Overview
//!
//! The import engine never talks to the filesystem, the network or the
//! system clock directly. Each of those capabilities is expressed as a
//! trait here and injected as an `Arc<dyn ...>`:
//!
//! - [`NoteStore`](store::NoteStore) - structured-document vault (frontmatter
//!   notes, binary blobs, folder management)
//! - [`HttpClient`](http::HttpClient) - async HTTP requests
//! - [`Clock`](time::Clock) / [`Sleeper`](time::Sleeper) - time source and
//!   suspension primitive for request throttling
//!
//! Desktop implementations live in the `vault-desktop` crate. An in-memory
//! [`MemoryNoteStore`](store::MemoryNoteStore) is provided here for tests.

pub mod error;
pub mod http;
pub mod store;
pub mod time;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use store::{Frontmatter, MemoryNoteStore, NoteStore};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
