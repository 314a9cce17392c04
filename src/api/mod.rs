//! HTTP client for the review service (`<endpoint>/v1/...`).

pub mod client;
pub mod error;
pub mod stream;

pub use client::ApiClient;
pub use error::ApiError;
