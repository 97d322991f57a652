//! Backend collaborators over HTTP.

mod client;
mod wire;

pub use client::HttpApiClient;
pub use wire::ProductPayload;
