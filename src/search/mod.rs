//! Search layer facade.
//!
//! - **[`query`]**: Query state (bounded term set, category, filters, page) and
//!   request construction for `GET /api/search`.
//! - **[`suggest`]**: Debounced autosuggest scheduling and stale-response tracking.

pub mod query;
pub mod suggest;
