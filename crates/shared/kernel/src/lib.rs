//! Kernel utilities shared across slices.
//! Keep this crate lightweight: layered config loading and the clock abstraction that business
//! rules read "today" from.
//!
//! ## Config loading
//! ```rust,ignore
//! use strata_kernel::config::load_config;
//! use strata_kernel::domain::config::AppConfig;
//!
//! let cfg: AppConfig = load_config(Some("strata.toml"))?;
//! ```
pub mod clock;
pub mod config;

pub use strata_domain as domain;
