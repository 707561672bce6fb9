//! Transport layer for padline.
//!
//! Currently provides HTTP transport via axum. The core and session
//! service are transport-agnostic; other transports would be added as
//! separate submodules.

pub mod http;

pub use http::{ServerConfig, serve};
