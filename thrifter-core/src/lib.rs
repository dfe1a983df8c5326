//! Core domain and persistence layer for the thrifter backend.
//!
//! This crate owns everything below the HTTP surface:
//!
//! - **Domain types**: users, roles, contact submissions and their input
//!   validation rules.
//! - **Authentication**: credential hashing ([`auth::AuthCrypto`]), the
//!   OTP-gated verification flow and the password-reset token lifecycle,
//!   orchestrated by [`auth::AuthenticationService`].
//! - **Persistence**: repository traits plus their Postgres implementations
//!   over a shared sqlx pool, with embedded migrations.
//!
//! The HTTP crate (`thrifter-server`) signs JWTs and sends email; this crate
//! never sees either concern beyond handing back raw secrets to deliver.

pub mod api_types;
pub mod auth;
pub mod database;
pub mod domain;
pub mod error;

pub use api_types::ApiResponse;
pub use auth::{AuthCrypto, AuthenticationError, AuthenticationService};
pub use database::PostgresDatabase;
pub use error::CoreError;
