//! HTTP transport for the Connect client.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Implements [`domain::Transport`] with `reqwest`. Owns
//! everything the core leaves out: base URL joining, bearer authentication,
//! default headers, timeouts, connection pooling and status mapping.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | [`ConnectConfig`] and environment loading |
//! | [`client`] | [`HttpTransport`] |

pub mod client;
pub mod config;

pub use client::HttpTransport;
pub use config::{ConfigError, ConnectConfig};
