//! App Store Connect API client
//!
//! Signs ES256 bearer tokens, sends JSON:API requests through a pluggable
//! [`Transport`], classifies failures into [`ApiError`] and exposes typed
//! wrappers for apps, versions, builds, TestFlight, reviews, subscriptions,
//! in-app purchases, releases and screenshots.
//!
//! ```no_run
//! # async fn run() -> appconnect_client::Result<()> {
//! use appconnect_client::Client;
//! use appconnect_core::config::resolve_config;
//!
//! let (config, _) = resolve_config(&std::env::current_dir()?)?;
//! let client = Client::new(config)?;
//! for build in client.list_builds(Some(5)).await? {
//!     println!("{} {:?}", build.id, build.attributes.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod error;
pub mod jsonapi;
pub mod resources;
pub mod session;
pub mod token;
pub mod transport;
pub mod upload;

pub use client::Client;
pub use error::{ApiError, ApiErrorKind, Error, Result};
pub use jsonapi::{Document, Resource};
pub use session::Session;
pub use token::{TokenCache, TokenGenerator};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
