//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Signup, login, refresh-token rotation, e-mail confirmation and password
//! reset live here, independent of the HTTP layer.

pub mod domain;
pub mod errors;
pub mod password;
pub mod tokens;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
