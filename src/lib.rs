//! licat - cached client for the Open Source Initiative license catalog
//!
//! This crate fetches the OSI license listing, enriches every record with
//! the plain-text license body scraped from its html page, and serves
//! cached, filtered and searchable views of the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use licat::Licat;
//!
//! #[tokio::main]
//! async fn main() -> licat::Result<()> {
//!     let client = Licat::builder().build()?;
//!
//!     // First call populates the snapshot; later calls are served from memory.
//!     for license in client.get_all().await?.iter() {
//!         println!("{} ({} chars)", license.name, license.license_text.len());
//!     }
//!
//!     if let Some(mit) = client.get_by_key("mit").await? {
//!         println!("{}", mit.license_text);
//!     }
//!
//!     let gpl = client.get_by_spdx_pattern("gpl*").await?;
//!     println!("{} GPL variants", gpl.len());
//!     Ok(())
//! }
//! ```
//!
//! # Failure model
//!
//! Read methods never surface network or decode failures; they degrade to
//! empty or partial results and log a warning. Use
//! [`CatalogClient::initialize()`] when readiness must be confirmed.
//!
//! # Blocking use
//!
//! ```rust,no_run
//! let client = licat::Licat::builder().build_blocking()?;
//! let apache = client.search("apache")?;
//! # Ok::<(), licat::LicatError>(())
//! ```

pub mod blocking;
pub mod cache;
pub mod catalog;
pub mod client;
#[cfg(feature = "config")]
pub mod config;
pub mod content;
pub mod error;
pub mod retry;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use cache::{TextCache, TextCacheConfig};
pub use client::{
    CatalogClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, Licat, LicatBuilder,
};
#[cfg(feature = "config")]
pub use config::ClientConfig;
pub use error::{LicatError, Result};
pub use retry::RetryConfig;
pub use transport::{Transport, TransportResponse};
pub use types::{FilterParam, Keyword, License, Link, Links};

// Re-exported so callers can pass cancellation tokens without a direct dependency.
pub use tokio_util::sync::CancellationToken;
