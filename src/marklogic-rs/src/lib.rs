//! MarkLogic Client Library
//!
//! HTTP client for the MarkLogic REST API: create, read and delete documents
//! (XML/JSON) and RDF graphs (RDF/XML, Turtle), authenticated with HTTP
//! Digest auth.
//!
//! Every operation sends one logical request and hands the server's response
//! back unchanged. Non-2xx statuses are ordinary [`Response`]s; only transport
//! failures are [`ClientError`]s.
//!
//! ```rust,no_run
//! use marklogic_rs::Client;
//!
//! #[tokio::main]
//! async fn main() -> marklogic_rs::Result<()> {
//!     let client = Client::new("http://localhost:8000", "admin", "admin")?;
//!
//!     let response = client.create_xml("tests/doc1.xml", "<doc/>").await?;
//!     println!("create: {}", response.status());
//!
//!     let response = client.get_document("tests/doc1.xml").await?;
//!     println!("get: {} {}", response.status(), response.text());
//!     Ok(())
//! }
//! ```

pub mod auth;
mod client;
mod payload;
mod response;

pub use client::Client;
pub use marklogic_core::{ClientConfig, GraphTarget, LATEST_API_VERSION};
pub use payload::Payload;
pub use response::Response;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Digest authentication error: {0}")]
    Auth(String),

    #[error("Failed to read payload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
