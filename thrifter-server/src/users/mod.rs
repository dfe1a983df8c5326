//! User management: authentication flows plus the admin CRUD surface.

pub mod admin_handlers;
pub mod auth;
