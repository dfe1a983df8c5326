//! # Thrifter Server
//!
//! REST backend for the thrifter app.
//!
//! ## Overview
//!
//! - **Authentication**: credential login with JWT access tokens and
//!   rotating opaque refresh tokens
//! - **Email verification**: OTP-gated activation for self-registered
//!   accounts, with resend cooldown and attempt ceiling
//! - **Password reset**: emailed single-use tokens with a short TTL
//! - **User management**: role-based admin CRUD with soft deletes
//! - **Contact form**: public submissions with an admin listing
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - PostgreSQL (sqlx) for persistent storage
//! - `thrifter-core` for domain logic and repositories
//! - SendGrid (via reqwest) for outbound email

pub mod contact;
pub mod infra;
pub mod mailer;
pub mod routes;
pub mod users;

pub use infra::app_state::AppState;

#[cfg(test)]
mod tests;
