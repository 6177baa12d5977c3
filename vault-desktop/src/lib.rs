//! # Desktop Bridge Implementations
//!
//! Desktop-ready implementations of the `vault-traits` capabilities:
//!
//! - [`ReqwestHttpClient`](http::ReqwestHttpClient) - HTTP via reqwest
//! - [`MarkdownVault`](store::MarkdownVault) - a folder of Markdown notes
//!   with YAML frontmatter, accessed through `tokio::fs`

pub mod http;
pub mod store;

pub use http::ReqwestHttpClient;
pub use store::MarkdownVault;
