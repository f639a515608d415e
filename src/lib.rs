//! Client for the SecurityRAT REST API.
//!
//! ```no_run
//! use secrat::{ConnectorConfig, Credentials, SecurityRatClient, model::TagInstance};
//!
//! # async fn run() -> secrat::Result<()> {
//! let client = SecurityRatClient::new(ConnectorConfig::new("https://rat.example.com/api")?)?;
//! client.authenticate(&Credentials::new("admin", "admin")).await?;
//! let tags: Vec<TagInstance> = client.list().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod entries;
pub mod error;
pub mod http;
pub mod model;
pub mod settings;

pub use client::{ContentFilter, ContentMatch, SecurityRatClient};
pub use config::{ConnectorConfig, Credentials};
pub use entries::EntryList;
pub use error::{ApiError, Result};
pub use http::RetryPolicy;
