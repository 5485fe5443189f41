//! # Domain Models
//!
//! Pure domain types with minimal dependencies (`serde`, `chrono`).
//! Keep it lean: no I/O, no business rules, just data and simple helpers.

pub mod config;
pub mod user;

pub use user::{NewUser, User, UserId};
