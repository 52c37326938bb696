//! Service layer providing the business operations behind the HTTP API.
//! - Separates business logic from data access and from the web framework.
//! - Reuses validation and entity definitions in `models` crate.
//! - Owns the storage root, outgoing mail, caching and rate limiting.

pub mod errors;
pub mod auth;
pub mod pagination;
pub mod contacts;
pub mod user_service;
pub mod storage;
pub mod mail;
pub mod cache;
pub mod rate_limiter;
#[cfg(test)]
pub mod test_support;
