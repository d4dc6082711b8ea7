//! # LoginUser
//!
//! Hands the authenticated user of an HTTP request to an axum handler as an
//! ordinary parameter.
//!
//! - [`auth`]: identity middleware and the `LoginUser` / `RequireLogin`
//!   extractors.
//! - [`api`]: demo routes built on those extractors.
//! - [`config`], [`cli`], [`server`]: running it as a binary.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod server;

// Re-export loginuser_core for convenience
pub use loginuser_core;
