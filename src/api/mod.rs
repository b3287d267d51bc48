//! Backend access: the [`SearchBackend`] seam and its reqwest implementation.

pub mod client;
pub mod error;

pub use client::{HttpBackend, SearchBackend};
pub use error::ApiError;
