//! # virtualizor-core
//!
//! Core types and utilities for talking to a Virtualizor control panel.
//!
//! This crate provides the pieces every panel operation shares: error handling,
//! client configuration and credentials, the action catalog, query encoding and
//! the HTTP transport.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy (validation, transport, malformed responses)
//! - [`config`] - Connection configuration, credentials and API variants
//! - [`action`] - Catalog of wire-level action codes
//! - [`query`] - Query string and form body encoding
//! - [`client`] - Transport abstraction and the reqwest-backed implementation

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod query;

// Re-export commonly used types
pub use action::Action;
pub use client::{ApiRequest, HttpTransport, Transport};
pub use config::{ApiVariant, ClientConfig, Credentials, Scheme};
pub use error::{Error, Result, TransportErrorKind};
