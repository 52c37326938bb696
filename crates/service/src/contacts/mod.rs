//! Contacts owned by a user: CRUD, search and upcoming birthdays.
//!
//! Every operation takes the owner's id; rows of other owners are invisible.

pub mod birthdays;
pub mod domain;
pub mod service;

pub use domain::{ContactCreate, ContactSearch, ContactUpdate};
