//! CRUD over book records.
//!
//! Any caller may read, update or delete any book: ownership is recorded in
//! `user_id` but never checked.

mod handler;
mod routes;

pub use routes::routes;
