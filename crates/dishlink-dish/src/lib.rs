//! # Dishlink Dish Client
//!
//! Everything that talks to the dish lives here: endpoint resolution and
//! auto-discovery, the per-poll HTTP fetch, and tolerant parsing of the
//! diagnostic payload.
//!
//! The crate exposes a single entry point, [`DishClient`], whose
//! [`fetch`](DishClient::fetch) contract is deliberately narrow: one
//! request per call, a bounded timeout, and no internal retries. Retry
//! and backoff policy belongs to the caller (the server's poll loop).

mod client;
mod diagnostic;
mod endpoint;
mod error;

pub use client::DishClient;
pub use endpoint::DishEndpoint;
pub use error::FetchError;
